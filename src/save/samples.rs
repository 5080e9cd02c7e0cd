use crate::error::Error;
use crate::error::Result;
use crate::sampling::samples::Samples;
use crate::tree::tree::Tree;
use std::collections::HashMap;
use std::path::Path;

/// observation files share the strategy file grammar with three
/// non negative integer counts per line. infosets a log never
/// visited may be omitted and read back as zeros.

pub fn write(tree: &Tree, samples: &Samples, path: &Path, comments: &[String]) -> Result<()> {
    if samples.len() != tree.decision_count() {
        return Err(Error::InvalidStrategy(format!(
            "observations cover {} decisions, tree has {}",
            samples.len(),
            tree.decision_count()
        )));
    }
    let mut lines = (0..tree.decision_count())
        .map(|index| {
            let counts = samples.counts(index);
            format!(
                "{} {} {} {}",
                tree.node(tree.decision(index)).path(),
                counts[0],
                counts[1],
                counts[2]
            )
        })
        .collect::<Vec<_>>();
    lines.sort();
    let mut text = String::new();
    for comment in comments {
        if comment.starts_with('#') {
            text.push_str(comment);
        } else {
            text.push_str("# ");
            text.push_str(comment);
        }
        text.push('\n');
    }
    for line in lines {
        text.push_str(&line);
        text.push('\n');
    }
    super::replace(path, &text)
}

pub fn read(tree: &Tree, path: &Path) -> Result<Samples> {
    let text = std::fs::read_to_string(path)?;
    parse(tree, &text)
}

pub fn parse(tree: &Tree, text: &str) -> Result<Samples> {
    let mut keys = HashMap::new();
    for index in 0..tree.decision_count() {
        keys.insert(tree.node(tree.decision(index)).path().to_string(), index);
    }
    let mut samples = Samples::new(tree.decision_count());
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields = line.split_whitespace().collect::<Vec<_>>();
        let [key, counts @ ..] = fields.as_slice() else {
            return Err(Error::InvalidStrategy(format!("unparseable line {}", line)));
        };
        let counts = counts
            .iter()
            .map(|field| {
                field
                    .parse::<u64>()
                    .map_err(|_| Error::InvalidStrategy(format!("unparseable line {}", line)))
            })
            .collect::<Result<Vec<_>>>()?;
        let [fold, call, raise] = counts.as_slice() else {
            return Err(Error::InvalidStrategy(format!(
                "expected three counts on line {}",
                line
            )));
        };
        let index = *keys.get(*key).ok_or_else(|| {
            Error::InvalidStrategy(format!("infoset {} is not in the game tree", key))
        })?;
        samples.set(index, [*fold, *call, *raise]);
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::action::Action;
    use crate::game::game::Game;
    use crate::tree::builder::Builder;

    #[test]
    fn observation_counts_round_trip() {
        let game = Game::leduc();
        let tree = Builder::build(&game).unwrap();
        let mut samples = Samples::new(tree.decision_count());
        samples.record(0, Action::Call);
        samples.record(0, Action::Raise);
        samples.record(7, Action::Fold);
        let path = std::env::temp_dir().join(format!(
            "pokerlab-{}-observations.samples",
            std::process::id()
        ));
        write(&tree, &samples, &path, &[]).unwrap();
        let restored = read(&tree, &path).unwrap();
        assert_eq!(samples, restored);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn omitted_infosets_read_as_zero() {
        let game = Game::kuhn();
        let tree = Builder::build(&game).unwrap();
        let samples = parse(&tree, "0: 1 2 3\n").unwrap();
        assert_eq!(samples.counts(0), &[1, 2, 3]);
        assert_eq!(samples.total(1), 0);
    }

    #[test]
    fn negative_counts_do_not_parse() {
        let game = Game::kuhn();
        let tree = Builder::build(&game).unwrap();
        assert!(parse(&tree, "0: -1 2 3\n").is_err());
    }
}
