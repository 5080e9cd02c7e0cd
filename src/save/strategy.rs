use crate::Probability;
use crate::cfr::strategy::Strategy;
use crate::error::Error;
use crate::error::Result;
use crate::tree::tree::Tree;
use std::collections::HashMap;
use std::path::Path;

/// strategy files are one line per decision infoset, the infoset
/// path followed by the fold, call and raise probabilities, with
/// `#` comments on top and lines sorted lexicographically.

pub fn lines(tree: &Tree, strategy: &Strategy) -> Vec<String> {
    (0..tree.decision_count())
        .map(|index| {
            let probs = strategy.probs(index);
            format!(
                "{} {} {} {}",
                tree.node(tree.decision(index)).path(),
                probs[0],
                probs[1],
                probs[2]
            )
        })
        .collect()
}

pub fn write(tree: &Tree, strategy: &Strategy, path: &Path, comments: &[String]) -> Result<()> {
    strategy.validate(tree)?;
    let mut sorted = lines(tree, strategy);
    sorted.sort();
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
    for line in sorted {
        text.push_str(&line);
        text.push('\n');
    }
    super::replace(path, &text)
}

pub fn read(tree: &Tree, path: &Path) -> Result<Strategy> {
    let text = std::fs::read_to_string(path)?;
    parse(tree, &text)
}

pub fn parse(tree: &Tree, text: &str) -> Result<Strategy> {
    let mut keys = HashMap::new();
    for index in 0..tree.decision_count() {
        keys.insert(tree.node(tree.decision(index)).path().to_string(), index);
    }
    let mut strategy = Strategy::empty(tree.decision_count());
    let mut covered = vec![false; tree.decision_count()];
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let key = fields
            .next()
            .ok_or_else(|| Error::InvalidStrategy(format!("unparseable line {}", line)))?;
        let probs = fields
            .map(|field| {
                field
                    .parse::<Probability>()
                    .map_err(|_| Error::InvalidStrategy(format!("unparseable line {}", line)))
            })
            .collect::<Result<Vec<_>>>()?;
        let [fold, call, raise] = probs.as_slice() else {
            return Err(Error::InvalidStrategy(format!(
                "expected three probabilities on line {}",
                line
            )));
        };
        let sum = fold + call + raise;
        if (sum - 1.0).abs() > crate::PROBABILITY_TOLERANCE {
            return Err(Error::InvalidStrategy(format!(
                "probabilities sum to {} on line {}",
                sum, line
            )));
        }
        let index = *keys.get(key).ok_or_else(|| {
            Error::InvalidStrategy(format!("infoset {} is not in the game tree", key))
        })?;
        strategy.set(index, [*fold, *call, *raise]);
        covered[index] = true;
    }
    if let Some(missing) = covered.iter().position(|&seen| !seen) {
        return Err(Error::MissingInfoset(
            tree.node(tree.decision(missing)).path().to_string(),
        ));
    }
    strategy.validate(tree)?;
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::options::Options;
    use crate::cfr::plus::CfrPlus;
    use crate::game::game::Game;
    use crate::tree::builder::Builder;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("pokerlab-{}-{}", std::process::id(), name))
    }

    #[test]
    fn trained_strategies_round_trip() {
        let game = Game::kuhn();
        let mut solver = CfrPlus::new(&game, 0).unwrap();
        let strategy = solver.solve(&Options::new(800)).unwrap();
        let path = scratch("round-trip.strategy");
        write(solver.tree(), &strategy, &path, &["trained for 800 iterations".to_string()])
            .unwrap();
        let restored = read(solver.tree(), &path).unwrap();
        for index in 0..strategy.len() {
            for action in 0..crate::NUM_ACTIONS {
                assert!(
                    (strategy.probs(index)[action] - restored.probs(index)[action]).abs()
                        < crate::VALUE_TOLERANCE
                );
            }
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn written_files_are_sorted_and_commented() {
        let game = Game::kuhn();
        let tree = Builder::build(&game).unwrap();
        let uniform = crate::cfr::strategy::Strategy::uniform(&tree);
        let path = scratch("sorted.strategy");
        write(&tree, &uniform, &path, &["a comment".to_string()]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "# a comment");
        let body = &lines[1..];
        let mut sorted = body.to_vec();
        sorted.sort();
        assert_eq!(body, sorted.as_slice());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn bad_lines_are_rejected() {
        let game = Game::kuhn();
        let tree = Builder::build(&game).unwrap();
        assert!(matches!(
            parse(&tree, "0: 0.5 0.4 0.3\n"),
            Err(Error::InvalidStrategy(_))
        ));
        assert!(matches!(
            parse(&tree, "9:nonsense 0 1 0\n"),
            Err(Error::InvalidStrategy(_))
        ));
        assert!(matches!(
            parse(&tree, "0: 0 1\n"),
            Err(Error::InvalidStrategy(_))
        ));
    }

    #[test]
    fn partial_files_miss_infosets() {
        let game = Game::kuhn();
        let tree = Builder::build(&game).unwrap();
        assert!(matches!(
            parse(&tree, "0: 0 1 0\n"),
            Err(Error::MissingInfoset(_))
        ));
    }
}
