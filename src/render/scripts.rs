//! Startup, shutdown and helper scripts.
//!
//! Host-process scripts drive `geth` and the tessera jar directly using the
//! endpoints of each node; container scripts delegate to `docker-compose`.

use super::tessera::host_config_file;
use crate::topology::types::{Consensus, NetworkTopology, NodeIdentity};
use crate::utils::version::supports_graphql;

pub const START: &str = "start.sh";
pub const STOP: &str = "stop.sh";
pub const ATTACH: &str = "attach.sh";
pub const RUNSCRIPT: &str = "runscript.sh";
pub const PUBLIC_CONTRACT: &str = "public-contract.js";
pub const PRIVATE_CONTRACT: &str = "private-contract.js";

const RPC_APIS: &str = "admin,db,eth,debug,miner,net,shh,txpool,personal,web3,quorum";

/// A script file and whether it should be executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub name: &'static str,
    pub content: String,
    pub executable: bool,
}

impl Script {
    fn shell(name: &'static str, content: String) -> Self {
        Self {
            name,
            content,
            executable: true,
        }
    }

    fn contract(name: &'static str, content: String) -> Self {
        Self {
            name,
            content,
            executable: false,
        }
    }
}

fn consensus_args(consensus: Consensus, node: &NodeIdentity) -> String {
    match (consensus, node.consensus.raft_port) {
        (Consensus::Raft, Some(raft_port)) => format!(
            "--raft --raftport {} --raftblocktime 50 --emitcheckpoints --rpcapi {},raft",
            raft_port, RPC_APIS
        ),
        _ => format!(
            "--istanbul.blockperiod 5 --syncmode full --mine --minerthreads 1 --rpcapi {},istanbul",
            RPC_APIS
        ),
    }
}

fn geth_command(topology: &NetworkTopology, number: usize, node: &NodeIdentity) -> String {
    let q = &node.consensus;
    let private_config = if node.privacy.is_some() {
        format!("qdata/c{}/tm.ipc", number)
    } else {
        "ignore".to_string()
    };

    let mut args = vec![
        format!("--datadir qdata/dd{}", number),
        "--nodiscover".to_string(),
        "--permissioned".to_string(),
        "--verbosity 5".to_string(),
        format!("--networkid {}", topology.network_id),
        format!("--rpc --rpcaddr {} --rpcport {} --rpccorsdomain=* --rpcvhosts=*", q.ip, q.rpc_port),
        format!("--ws --wsaddr {} --wsport {} --wsorigins=* --wsapi {}", q.ip, q.ws_port, RPC_APIS),
        format!("--port {}", q.p2p_port),
        format!("--unlock 0 --password qdata/dd{}/keystore/password.txt", number),
        consensus_args(topology.consensus, node),
    ];
    if supports_graphql(&topology.quorum_version) {
        args.push(format!(
            "--allow-insecure-unlock --graphql --graphql.port {} --graphql.corsdomain=* --graphql.addr={}",
            q.graphql_port, q.ip
        ));
    }

    format!(
        "PRIVATE_CONFIG={} nohup $BIN_GETH {} >> qdata/logs/{}.log 2>&1 &\n",
        private_config,
        args.join(" "),
        number
    )
}

fn host_start(topology: &NetworkTopology) -> String {
    let mut script = String::from("#!/bin/bash\n# Start the local network\nset -u\nset -e\n\n");
    script.push_str("cd \"$(dirname \"$0\")\"\n");
    script.push_str("BIN_GETH=${BIN_GETH:-geth}\n");
    if topology.has_tessera() {
        script.push_str("BIN_TESSERA=${BIN_TESSERA:-tessera-app.jar}\n");
    }
    script.push('\n');

    script.push_str("echo \"[*] Initialising node data directories\"\n");
    for (number, _) in topology.numbered_nodes() {
        script.push_str(&format!(
            "$BIN_GETH --datadir qdata/dd{n} init qdata/dd{n}/genesis.json >> qdata/logs/{n}.log 2>&1\n",
            n = number
        ));
    }

    if topology.has_tessera() {
        script.push_str("\necho \"[*] Starting tessera nodes\"\n");
        for (number, _) in topology.numbered_nodes() {
            script.push_str(&format!(
                "java -Xms128M -Xmx128M -jar $BIN_TESSERA -configfile qdata/c{n}/{file} >> qdata/logs/tessera{n}.log 2>&1 &\n",
                n = number,
                file = host_config_file(number)
            ));
        }
        script.push_str("\necho \"[*] Waiting for tessera sockets\"\n");
        for (number, _) in topology.numbered_nodes() {
            script.push_str(&format!(
                "while [ ! -S qdata/c{n}/tm.ipc ]; do sleep 1; done\n",
                n = number
            ));
        }
    }

    script.push_str("\necho \"[*] Starting quorum nodes\"\n");
    for (number, node) in topology.numbered_nodes() {
        script.push_str(&geth_command(topology, number, node));
    }
    if let Some(explorer) = &topology.explorer {
        script.push_str("\necho \"[*] Starting cakeshop\"\n");
        script.push_str("BIN_CAKESHOP=${BIN_CAKESHOP:-cakeshop.war}\n");
        script.push_str(&format!(
            "java -Dspring.config.additional-location=file:qdata/cakeshop/local/ -Dcakeshop.config.dir=qdata/cakeshop -jar $BIN_CAKESHOP >> qdata/logs/cakeshop.log 2>&1 &\necho \"Cakeshop: http://{}:{}\"\n",
            explorer.ip, explorer.port
        ));
    }
    script.push_str("\necho \"[*] Network started\"\n");
    script
}

fn host_stop(topology: &NetworkTopology) -> String {
    let mut script = String::from("#!/bin/bash\n# Stop the local network\n");
    script.push_str("killall -INT geth\n");
    if topology.has_tessera() || topology.has_explorer() {
        script.push_str("killall -INT java\n");
    }
    script
}

fn runscript(topology: &NetworkTopology) -> String {
    if topology.is_container() {
        "#!/bin/bash\ndocker-compose exec node1 /bin/sh -c \"geth --exec 'loadScript(\\\"/examples/$1\\\")' attach /qdata/dd/geth.ipc\"\n".to_string()
    } else {
        "#!/bin/bash\ncd \"$(dirname \"$0\")\"\nBIN_GETH=${BIN_GETH:-geth}\n$BIN_GETH --exec \"loadScript(\\\"$1\\\")\" attach qdata/dd1/geth.ipc\n".to_string()
    }
}

fn attach(topology: &NetworkTopology) -> String {
    let usage = format!(
        "if [ -z \"${{1:-}}\" ] || [ \"$1\" -lt 1 ] || [ \"$1\" -gt {count} ]; then\n  echo \"Usage: ./attach.sh <node number 1-{count}>\"\n  exit 1\nfi\n",
        count = topology.node_count
    );
    if topology.is_container() {
        format!(
            "#!/bin/bash\n{}docker-compose exec node$1 /bin/sh -c \"geth attach /qdata/dd/geth.ipc\"\n",
            usage
        )
    } else {
        format!(
            "#!/bin/bash\ncd \"$(dirname \"$0\")\"\n{}BIN_GETH=${{BIN_GETH:-geth}}\n$BIN_GETH attach qdata/dd$1/geth.ipc\n",
            usage
        )
    }
}

const CONTRACT_BODY: &str = "var abi = [{\"constant\":true,\"inputs\":[],\"name\":\"storedData\",\"outputs\":[{\"name\":\"\",\"type\":\"uint256\"}],\"payable\":false,\"type\":\"function\"},{\"constant\":false,\"inputs\":[{\"name\":\"x\",\"type\":\"uint256\"}],\"name\":\"set\",\"outputs\":[],\"payable\":false,\"type\":\"function\"},{\"constant\":true,\"inputs\":[],\"name\":\"get\",\"outputs\":[{\"name\":\"retVal\",\"type\":\"uint256\"}],\"payable\":false,\"type\":\"function\"},{\"inputs\":[{\"name\":\"initVal\",\"type\":\"uint256\"}],\"payable\":false,\"type\":\"constructor\"}];\n\
var bytecode = \"0x6060604052341561000f57600080fd5b604051602080610149833981016040528080519060200190919050505b806000819055505b505b610104806100456000396000f30060606040526000357c0100000000000000000000000000000000000000000000000000000000900463ffffffff1680632a1afcd914605157806360fe47b11460775780636d4ce63c146097575b600080fd5b3415605b57600080fd5b606160bd565b6040518082815260200191505060405180910390f35b3415608157600080fd5b6095600480803590602001909190505060c3565b005b341560a157600080fd5b60a760ce565b6040518082815260200191505060405180910390f35b60005481565b806000819055505b50565b6000805490505b905600a165627a7a72305820d5851baab720bba574474de3d09dbeaabc674a15f4dd93b974908476542c23f00029\";\n\
var simpleContract = web3.eth.contract(abi);\n";

fn contract_script(private_for: Option<&str>) -> String {
    let private_for = private_for
        .map(|key| format!(", privateFor: [\"{}\"]", key.trim()))
        .unwrap_or_default();
    format!(
        "a = eth.accounts[0]\nweb3.eth.defaultAccount = a;\n\n{}\
var simple = simpleContract.new(42, {{from: web3.eth.accounts[0], data: bytecode, gas: 0x47b760{}}}, function(e, contract) {{\n\
\tif (e) {{\n\t\tconsole.log(\"err creating contract\", e);\n\t}} else {{\n\
\t\tif (!contract.address) {{\n\t\t\tconsole.log(\"Contract transaction send: TransactionHash: \" + contract.transactionHash + \" waiting to be mined...\");\n\
\t\t}} else {{\n\t\t\tconsole.log(\"Contract mined! Address: \" + contract.address);\n\t\t\tconsole.log(contract);\n\t\t}}\n\t}}\n}});\n",
        CONTRACT_BODY, private_for
    )
}

/// Every script of the network. `private_for` is the privacy public key of
/// the recipient node used by the private contract example.
pub fn build_scripts(topology: &NetworkTopology, private_for: Option<&str>) -> Vec<Script> {
    let (start, stop) = if topology.is_container() {
        (
            "#!/bin/bash\ncd \"$(dirname \"$0\")\"\ndocker-compose up -d\n".to_string(),
            "#!/bin/bash\ncd \"$(dirname \"$0\")\"\ndocker-compose down\n".to_string(),
        )
    } else {
        (host_start(topology), host_stop(topology))
    };

    let mut scripts = vec![
        Script::shell(START, start),
        Script::shell(STOP, stop),
        Script::shell(ATTACH, attach(topology)),
        Script::shell(RUNSCRIPT, runscript(topology)),
        Script::contract(PUBLIC_CONTRACT, contract_script(None)),
    ];
    if topology.has_tessera() {
        if let Some(key) = private_for {
            scripts.push(Script::contract(PRIVATE_CONTRACT, contract_script(Some(key))));
        }
    }
    scripts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::builder::tests::{answers, sample_topology};
    use std::path::Path;

    fn find<'a>(scripts: &'a [Script], name: &str) -> &'a Script {
        scripts.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn test_host_start_uses_node_endpoints() {
        let topology = sample_topology(Path::new("/tmp"));
        let scripts = build_scripts(&topology, Some("QfeDAys9MPDs2XHExtc84jKGHxZg/aj52DTh0vtA3Xc=\n"));
        let start = &find(&scripts, START).content;

        assert_eq!(start.matches("nohup $BIN_GETH").count(), 3);
        assert!(start.contains("--port 21002"));
        assert!(start.contains("--raftport 50403"));
        assert!(start.contains("--rpcport 22000"));
        assert!(start.contains("PRIVATE_CONFIG=qdata/c1/tm.ipc"));
        assert!(start.contains("-configfile qdata/c3/tessera-config-09-3.json"));
        assert!(start.contains("--graphql.port 24001"));

        let private = find(&scripts, PRIVATE_CONTRACT);
        assert!(private.content.contains("privateFor: [\"QfeDAys9MPDs2XHExtc84jKGHxZg/aj52DTh0vtA3Xc=\"]"));
        assert!(!private.executable);
        assert!(find(&scripts, STOP).content.contains("killall -INT java"));
    }

    #[test]
    fn test_container_scripts_delegate_to_compose() {
        let topology = NetworkTopology::from_answers(&answers(
            "name: d\nnumberNodes: 2\nconsensus: istanbul\ndeployment: docker-compose\n",
        ))
        .unwrap();
        let scripts = build_scripts(&topology, None);

        assert!(find(&scripts, START).content.contains("docker-compose up -d"));
        assert!(find(&scripts, ATTACH).content.contains("docker-compose exec node$1"));
        assert!(scripts.iter().all(|s| s.name != PRIVATE_CONTRACT));
        assert_eq!(scripts.len(), 5);
    }

    #[test]
    fn test_bft_start_has_no_raft_flags() {
        let topology = NetworkTopology::from_answers(&answers(
            "name: b\nnumberNodes: 2\nconsensus: istanbul\ndeployment: bash\nquorumVersion: 2.5.0\n",
        ))
        .unwrap();
        let scripts = build_scripts(&topology, None);
        let start = &find(&scripts, START).content;

        assert!(!start.contains("--raft"));
        assert!(start.contains("--istanbul.blockperiod 5"));
        assert!(!start.contains("--graphql"));
        assert!(start.contains("PRIVATE_CONFIG=ignore"));
    }
}
