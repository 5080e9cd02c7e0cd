use crate::error::Error;
use crate::error::Result;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

/// record of a portfolio build, written next to the selected
/// response strategies so a playing agent can reload the whole
/// set and its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// gamedef text of the game the portfolio was built for
    pub game: String,
    /// opponent strategy files, in training order
    pub opponents: Vec<String>,
    /// selected response strategy files, in greedy order
    pub responses: Vec<String>,
    /// indices of the selected responses into the opponent list
    pub selected: Vec<usize>,
    /// full exploitation matrix, responses by opponents, mbb/g
    pub utilities: Vec<Vec<f64>>,
}

pub fn write(manifest: &Manifest, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(manifest)
        .map_err(|error| Error::Io(std::io::Error::other(error.to_string())))?;
    super::replace(path, &text)
}

pub fn read(path: &Path) -> Result<Manifest> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|error| Error::Io(std::io::Error::other(error.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::game::Game;

    #[test]
    fn manifests_round_trip() {
        let manifest = Manifest {
            game: Game::kuhn().to_string(),
            opponents: vec!["weak-folder.strategy".to_string()],
            responses: vec!["response-0.strategy".to_string()],
            selected: vec![0],
            utilities: vec![vec![123.4]],
        };
        let path = std::env::temp_dir().join(format!(
            "pokerlab-{}-portfolio.json",
            std::process::id()
        ));
        write(&manifest, &path).unwrap();
        assert_eq!(read(&path).unwrap(), manifest);
        std::fs::remove_file(&path).ok();
    }
}
