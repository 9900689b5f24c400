use crate::config::Answers;
use crate::topology::types::NetworkTopology;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs::File;
use std::path::Path;

/// Persisted topology file name inside the network directory
pub const STATE_FILE: &str = "config.json";

/// Load the answers record from a YAML (or JSON) file
pub fn load_answers(path: &Path) -> Result<Answers> {
    info!("Loading answers from: {:?}", path);

    let file = File::open(path).wrap_err_with(|| format!("Failed to open answers file {:?}", path))?;

    // JSON is valid YAML, so one parser covers both
    let answers: Answers =
        serde_yaml::from_reader(file).wrap_err_with(|| format!("Failed to parse answers file {:?}", path))?;

    if answers.customize_ports && answers.nodes.is_empty() {
        warn!("customizePorts is set but no node table was given");
    }

    Ok(answers)
}

/// Build a topology straight from an answers file
pub fn load_topology(path: &Path) -> Result<NetworkTopology> {
    let answers = load_answers(path)?;
    let topology = NetworkTopology::from_answers(&answers)?;
    Ok(topology)
}

/// Load and re-validate a persisted topology
pub fn load_state(path: &Path) -> Result<NetworkTopology> {
    info!("Loading network state from: {:?}", path);

    let file = File::open(path).wrap_err_with(|| format!("Failed to open state file {:?}", path))?;
    let topology: NetworkTopology =
        serde_json::from_reader(file).wrap_err_with(|| format!("Failed to parse state file {:?}", path))?;

    topology.validate()?;

    Ok(topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_yaml_answers() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "name: demo\nnumberNodes: 3\nconsensus: raft\ntransactionManager: tessera\ndeployment: bash\n"
        )
        .unwrap();

        let topology = load_topology(file.path()).unwrap();
        assert_eq!(topology.node_count, 3);
        assert!(topology.has_tessera());
    }

    #[test]
    fn test_load_json_answers() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"name":"j","numberNodes":"2","consensus":"istanbul","deployment":"docker-compose"}}"#
        )
        .unwrap();

        let answers = load_answers(file.path()).unwrap();
        assert_eq!(answers.name, "j");
    }

    #[test]
    fn test_invalid_answers_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name: x\nnumberNodes: 12\nconsensus: raft\ndeployment: bash\n").unwrap();
        assert!(load_topology(file.path()).is_err());
    }

    #[test]
    fn test_state_round_trip_is_validated() {
        let mut file = NamedTempFile::new().unwrap();
        let topology = crate::topology::builder::tests::sample_topology(Path::new("/tmp"));
        let mut json = serde_json::to_value(&topology).unwrap();
        write!(file, "{}", json).unwrap();
        assert_eq!(load_state(file.path()).unwrap(), topology);

        json["network_id"] = serde_json::json!(1);
        let mut tampered = NamedTempFile::new().unwrap();
        write!(tampered, "{}", json).unwrap();
        assert!(load_state(tampered.path()).is_err());
    }
}
