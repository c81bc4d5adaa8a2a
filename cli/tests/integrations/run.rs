use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const ITEMS: &str = r#"
rule HondaDiscount "Honda gets a discount" salience 10 {
    when Item.Name == "Honda" && Item.Discount == 0
    then Item.Discount = 30; Retract("HondaDiscount");
}
rule Expensive {
    when Item.Price > 2000 && Item.Tag == nil
    then Item.Tag = "expensive";
}
"#;

fn workspace(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (name, contents) in files {
        fs::write(temp_dir.path().join(name), contents).unwrap();
    }
    temp_dir
}

fn ferrule() -> Command {
    Command::cargo_bin("ferrule").unwrap()
}

const HONDA: &str = r#"Item={"Name":"Honda","Price":2300,"Discount":0,"Tag":null}"#;

#[test]
fn test_cli_run_fires_rules_and_prints_facts() {
    let temp_dir = workspace(&[("items.grl", ITEMS)]);

    ferrule()
        .arg("run")
        .arg("items")
        .arg(HONDA)
        .arg("--dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Rule set: items@0.0.1"))
        .stdout(predicate::str::contains("HondaDiscount"))
        .stdout(predicate::str::contains("Expensive"))
        .stdout(predicate::str::contains("Outcome: quiescent after 2 cycle(s)"))
        .stdout(predicate::str::contains("Retracted: HondaDiscount"))
        .stdout(predicate::str::contains(r#""Discount": 30"#))
        .stdout(predicate::str::contains(r#""Tag": "expensive""#));
}

#[test]
fn test_cli_run_raw_outputs_json_only() {
    let temp_dir = workspace(&[("items.grl", ITEMS)]);

    let output = ferrule()
        .args(["run", "items", HONDA, "--raw", "--dir"])
        .arg(temp_dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let facts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(facts["Item"]["Discount"], serde_json::json!(30));
    assert_eq!(facts["Item"]["Tag"], serde_json::json!("expensive"));
}

#[test]
fn test_cli_run_with_facts_file_and_override() {
    let temp_dir = workspace(&[
        ("items.grl", ITEMS),
        (
            "facts.json",
            r#"{"Item": {"Name": "Hero", "Price": 100, "Discount": 0, "Tag": null}}"#,
        ),
    ]);

    ferrule()
        .arg("run")
        .arg("items")
        .arg("--facts")
        .arg(temp_dir.path().join("facts.json"))
        .arg("--dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No rules fired."));

    ferrule()
        .arg("run")
        .arg("items")
        .arg("--facts")
        .arg(temp_dir.path().join("facts.json"))
        .arg(HONDA)
        .arg("--dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""Discount": 30"#));
}

#[test]
fn test_cli_run_versioned_rule_sets() {
    let temp_dir = workspace(&[
        ("items.grl", ITEMS),
        (
            "items@1.2.0.grl",
            r#"rule Flat { when Item.Discount == 0 then Item.Discount = 5; }"#,
        ),
    ]);

    ferrule()
        .args(["run", "items", HONDA, "--dir"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("has several versions (0.0.1, 1.2.0)"));

    ferrule()
        .args(["run", "items@1.2.0", HONDA, "--dir"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Rule set: items@1.2.0"))
        .stdout(predicate::str::contains(r#""Discount": 5"#));
}

#[test]
fn test_cli_match_lists_rules_in_firing_order() {
    let temp_dir = workspace(&[("items.grl", ITEMS)]);

    let output = ferrule()
        .args(["match", "items", HONDA, "--dir"])
        .arg(temp_dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let discount = stdout.find("HondaDiscount").unwrap();
    let expensive = stdout.find("Expensive").unwrap();
    assert!(discount < expensive);
    assert!(stdout.contains("Honda gets a discount"));
}

#[test]
fn test_cli_match_without_matches() {
    let temp_dir = workspace(&[("items.grl", ITEMS)]);

    ferrule()
        .arg("match")
        .arg("items")
        .arg(r#"Item={"Name":"Hero","Price":10,"Discount":5,"Tag":null}"#)
        .arg("--dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No rules match."));
}

#[test]
fn test_cli_show_prints_rules() {
    let temp_dir = workspace(&[("items.grl", ITEMS)]);

    ferrule()
        .args(["show", "items", "--dir"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("rules (2):"))
        .stdout(predicate::str::contains(
            r#"rule HondaDiscount "Honda gets a discount" salience 10 {"#,
        ))
        .stdout(predicate::str::contains("rule Expensive salience 0 {"));
}

#[test]
fn test_cli_list_summarizes_workspace() {
    let temp_dir = workspace(&[
        ("items.grl", ITEMS),
        (
            "orders@1.2.0.grl",
            "rule Ship { when Order.Total > 100 then Order.Free = true; }",
        ),
        ("notes.txt", "not a rule file"),
    ]);

    ferrule()
        .arg("list")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Workspace contains 2 files, 2 rule sets",
        ))
        .stdout(predicate::str::contains("items@0.0.1: 2 rules"))
        .stdout(predicate::str::contains("orders@1.2.0: 1 rules"));
}

#[test]
fn test_cli_reports_parse_errors() {
    let temp_dir = workspace(&[("broken.grl", "rule R {\n  when true\n  A.B = 1;\n}")]);

    ferrule()
        .args(["show", "broken", "--dir"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parse error"))
        .stderr(predicate::str::contains("broken@0.0.1:3:3"));
}

#[test]
fn test_cli_reports_missing_rule_set() {
    let temp_dir = workspace(&[("items.grl", ITEMS)]);

    ferrule()
        .args(["run", "nope", "--dir"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Rule set 'nope' not found"));
}

#[test]
fn test_cli_reports_cycle_limit() {
    let temp_dir = workspace(&[(
        "loop.grl",
        r#"rule Loop { when C.N >= 0 then C.N = C.N + 1; }"#,
    )]);

    ferrule()
        .args(["run", "loop", r#"C={"N":0}"#, "--max-cycles", "5", "--dir"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Cycle limit exceeded: rules still matching after 5 cycles",
        ))
        .stderr(predicate::str::contains("Last fired rule: Loop"));
}

#[test]
fn test_cli_rejects_malformed_fact() {
    let temp_dir = workspace(&[("items.grl", ITEMS)]);

    ferrule()
        .args(["run", "items", "Item", "--dir"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected NAME=JSON"));
}
