//! End-to-end tests that invoke the built `minhs` binary against real files,
//! the way a user would from the command line.

use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn minhs() -> Command {
    Command::new(env!("CARGO_BIN_EXE_minhs"))
}

#[test]
fn solves_json_instance_and_writes_solution_and_report() {
    let dir = tempdir().unwrap();
    let instance_path = dir.path().join("instance.json");
    let config_path = dir.path().join("config.json");
    let solution_path = dir.path().join("solution.json");
    let report_path = dir.path().join("report.json");

    fs::write(
        &instance_path,
        r#"{"num_vertices": 6, "edges": [[0,1,2],[1,2,3],[2,3,4],[3,4,5]]}"#,
    )
    .unwrap();
    fs::write(&config_path, "{}").unwrap();

    let status = minhs()
        .arg("solve")
        .arg(&instance_path)
        .arg(&config_path)
        .arg("--solution")
        .arg(&solution_path)
        .arg("--report")
        .arg(&report_path)
        .status()
        .expect("run minhs solve");
    assert!(status.success(), "expected exit code 0 for a proved-optimal solve");

    let solution: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&solution_path).unwrap()).unwrap();
    assert_eq!(solution["size"], 2);
    assert_eq!(solution["hitting_set"].as_array().unwrap().len(), 2);

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["opt"], 2);
    assert_eq!(report["proved_optimal"], true);
}

#[test]
fn solves_hgr_instance_via_flag() {
    let dir = tempdir().unwrap();
    let instance_path = dir.path().join("instance.hgr");
    let config_path = dir.path().join("config.json");

    fs::write(&instance_path, "c example\np hs 6 4\n1 2 3\n2 3 4\n3 4 5\n4 5 6\n").unwrap();
    fs::write(&config_path, "{}").unwrap();

    let status = minhs()
        .arg("solve")
        .arg(&instance_path)
        .arg(&config_path)
        .arg("--hgr")
        .status()
        .expect("run minhs solve --hgr");
    assert!(status.success());
}

#[test]
fn exits_with_feasible_code_when_stop_at_prevents_a_proof() {
    let dir = tempdir().unwrap();
    let instance_path = dir.path().join("instance.json");
    let config_path = dir.path().join("config.json");

    fs::write(
        &instance_path,
        r#"{"num_vertices": 6, "edges": [[0,1,2],[1,2,3],[2,3,4],[3,4,5]]}"#,
    )
    .unwrap();
    fs::write(&config_path, r#"{"stop_at": 2}"#).unwrap();

    let status = minhs()
        .arg("solve")
        .arg(&instance_path)
        .arg(&config_path)
        .status()
        .expect("run minhs solve");
    assert_eq!(status.code(), Some(2));
}

#[test]
fn exits_with_input_error_code_on_malformed_instance() {
    let dir = tempdir().unwrap();
    let instance_path = dir.path().join("instance.json");
    let config_path = dir.path().join("config.json");

    fs::write(&instance_path, "not json").unwrap();
    fs::write(&config_path, "{}").unwrap();

    let status = minhs()
        .arg("solve")
        .arg(&instance_path)
        .arg(&config_path)
        .status()
        .expect("run minhs solve");
    assert_eq!(status.code(), Some(64));
}

#[test]
fn unit_forcing_scenario_finds_known_optimum() {
    // 1-based edges {[7],[1,2,3],[3,4]}, translated to 0-based: the size-1
    // edge forces vertex 7 (id 6), leaving {[1,2,3],[3,4]} (ids {0,1,2},
    // {2,3}), both hit by vertex 3 (id 2). Known optimum H = {3, 7}, i.e.
    // 0-based {2, 6}.
    let dir = tempdir().unwrap();
    let instance_path = dir.path().join("instance.json");
    let config_path = dir.path().join("config.json");

    fs::write(
        &instance_path,
        r#"{"num_vertices": 7, "edges": [[6],[0,1,2],[2,3]]}"#,
    )
    .unwrap();
    fs::write(&config_path, "{}").unwrap();

    let solution_path = dir.path().join("solution.json");
    let status = minhs()
        .arg("solve")
        .arg(&instance_path)
        .arg(&config_path)
        .arg("--solution")
        .arg(&solution_path)
        .status()
        .expect("run minhs solve");
    assert!(status.success());

    let solution: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&solution_path).unwrap()).unwrap();
    let mut hitting_set: Vec<u64> = solution["hitting_set"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_u64().unwrap())
        .collect();
    hitting_set.sort_unstable();
    assert_eq!(hitting_set, vec![2, 6]);
}

#[test]
fn domination_scenario_finds_known_optimum() {
    // 1-based edges {[1,2,3],[1,2],[1,3]}, translated to 0-based: vertex 1
    // (id 0) is a member of every edge, so the known optimum is H = {1},
    // i.e. 0-based {0}.
    let dir = tempdir().unwrap();
    let instance_path = dir.path().join("instance.json");
    let config_path = dir.path().join("config.json");

    fs::write(
        &instance_path,
        r#"{"num_vertices": 3, "edges": [[0,1,2],[0,1],[0,2]]}"#,
    )
    .unwrap();
    fs::write(&config_path, "{}").unwrap();

    let solution_path = dir.path().join("solution.json");
    let status = minhs()
        .arg("solve")
        .arg(&instance_path)
        .arg(&config_path)
        .arg("--solution")
        .arg(&solution_path)
        .status()
        .expect("run minhs solve");
    assert!(status.success());

    let solution: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&solution_path).unwrap()).unwrap();
    assert_eq!(solution["hitting_set"].as_array().unwrap(), &vec![serde_json::json!(0)]);
}

#[test]
fn empty_edge_list_yields_empty_proved_optimal_solution() {
    let dir = tempdir().unwrap();
    let instance_path = dir.path().join("instance.json");
    let config_path = dir.path().join("config.json");

    fs::write(&instance_path, r#"{"num_vertices": 3, "edges": []}"#).unwrap();
    fs::write(&config_path, "{}").unwrap();

    let solution_path = dir.path().join("solution.json");
    let report_path = dir.path().join("report.json");
    let status = minhs()
        .arg("solve")
        .arg(&instance_path)
        .arg(&config_path)
        .arg("--solution")
        .arg(&solution_path)
        .arg("--report")
        .arg(&report_path)
        .status()
        .expect("run minhs solve");
    assert!(status.success());

    let solution: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&solution_path).unwrap()).unwrap();
    assert_eq!(solution["size"], 0);
    assert!(solution["hitting_set"].as_array().unwrap().is_empty());

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["proved_optimal"], true);
}

#[test]
fn single_edge_yields_size_one_solution() {
    let dir = tempdir().unwrap();
    let instance_path = dir.path().join("instance.json");
    let config_path = dir.path().join("config.json");

    fs::write(&instance_path, r#"{"num_vertices": 4, "edges": [[0,1,2,3]]}"#).unwrap();
    fs::write(&config_path, "{}").unwrap();

    let solution_path = dir.path().join("solution.json");
    let status = minhs()
        .arg("solve")
        .arg(&instance_path)
        .arg(&config_path)
        .arg("--solution")
        .arg(&solution_path)
        .status()
        .expect("run minhs solve");
    assert!(status.success());

    let solution: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&solution_path).unwrap()).unwrap();
    assert_eq!(solution["size"], 1);
}

#[test]
fn exits_with_config_error_code_on_bad_initial_hitting_set() {
    let dir = tempdir().unwrap();
    let instance_path = dir.path().join("instance.json");
    let config_path = dir.path().join("config.json");

    fs::write(&instance_path, r#"{"num_vertices": 3, "edges": [[0,1],[1,2]]}"#).unwrap();
    fs::write(&config_path, r#"{"initial_hitting_set": [0]}"#).unwrap();

    let status = minhs()
        .arg("solve")
        .arg(&instance_path)
        .arg(&config_path)
        .status()
        .expect("run minhs solve");
    assert_eq!(status.code(), Some(64));
}
