use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::NamedTempFile;

use std::io::Write;

const JOURNAL: &str = "\
account Assets:Checking
account Assets:Savings
account Income:Salary
payee Employer

2021/01/31 * Employer
    Assets:Checking
    Income:Salary  -1000 EUR

2021/02/01 Grocer
    Expenses:Food  €12.50
    Assets:Checking  €-12.50
";

const RULES: &str = "\
= /Income:Salary/
    Assets:Savings  -0.3
    Assets:Checking  0.3
";

fn file(contents: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(contents.as_bytes()).unwrap();
    tmp
}

fn autoledger() -> Command {
    let mut cmd = Command::cargo_bin("autoledger").unwrap();
    cmd.env_remove("AUTOLEDGER_RULES")
        .env_remove("AUTOLEDGER_DOT_COLUMN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn check_accepts_a_clean_journal() {
    let journal = file(JOURNAL);
    autoledger()
        .arg("check")
        .arg(journal.path())
        .assert()
        .success()
        .stdout(contains("2 transactions, 0 automatic, 0 periodic, 0 rejected"));
}

#[test]
fn check_reports_rejected_transactions() {
    let journal = file("2021/01/31 Broken\n    A\n    B\n\n2021/02/01 Fine\n    A  1 EUR\n    B\n");
    autoledger()
        .arg("check")
        .arg(journal.path())
        .assert()
        .failure()
        .stdout(contains(":1: more than one posting has its amount elided"))
        .stdout(contains("1 transactions, 0 automatic, 0 periodic, 1 rejected"));
}

#[test]
fn check_warns_about_unbalanced_transactions() {
    let journal = file("2021/01/31 Off\n    A  1 EUR\n    B  -0.50 EUR\n");
    autoledger()
        .arg("check")
        .arg(journal.path())
        .assert()
        .success()
        .stdout(contains(":1: warning: transaction does not balance, off by 0.50 EUR"));
}

#[test]
fn check_warns_when_postings_overflow() {
    let journal = file(
        "2021/01/31 Huge\n\
         \x20   A  79,228,162,514,264,337,593,543,950,335 EUR\n\
         \x20   B  79,228,162,514,264,337,593,543,950,335 EUR\n\
         \n\
         2021/02/01 Off\n\
         \x20   A  1 EUR\n\
         \x20   B  -0.50 EUR\n",
    );
    autoledger()
        .arg("check")
        .arg(journal.path())
        .assert()
        .success()
        .stdout(contains(":1: warning: cannot sum postings"))
        .stdout(contains(":5: warning: transaction does not balance"))
        .stdout(contains("2 transactions, 0 automatic, 0 periodic, 0 rejected"));
}

#[test]
fn check_fails_on_parse_error() {
    let journal = file("2021/01/31 Employer\n    Assets:Checking  12.505 EUR\n");
    autoledger()
        .arg("check")
        .arg(journal.path())
        .assert()
        .failure()
        .stderr(contains("failed to parse"))
        .stderr(contains("2:"));
}

#[test]
fn derive_with_rules_file() {
    let journal = file(JOURNAL);
    let rules = file(RULES);
    autoledger()
        .arg("derive")
        .arg(journal.path())
        .arg("--rules")
        .arg(rules.path())
        .assert()
        .success()
        .stdout(contains(":8: Income:Salary matched rule #0 /Income:Salary/"))
        .stdout(contains(format!(" at {}:1\n", rules.path().display())))
        .stdout(contains("    Assets:Savings").and(contains("300.00 EUR")))
        .stdout(contains("-300.00 EUR"))
        .stdout(contains("Expenses:Food").not());
}

#[test]
fn derive_reads_rules_and_dot_column_from_env() {
    let journal = file(JOURNAL);
    let rules = file(RULES);
    let output = autoledger()
        .arg("derive")
        .arg(journal.path())
        .env("AUTOLEDGER_RULES", rules.path())
        .env("AUTOLEDGER_DOT_COLUMN", "30")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let derived: Vec<&str> = stdout.lines().filter(|l| l.starts_with("    ")).collect();
    assert_eq!(derived.len(), 2);
    for line in derived {
        assert_eq!(line.find('.'), Some(30), "{:?}", line);
    }
}

#[test]
fn derive_defaults_to_journal_rules() {
    let journal = file(&format!("{}\n{}", RULES, JOURNAL));
    autoledger()
        .arg("derive")
        .arg(journal.path())
        .assert()
        .success()
        .stdout(contains("Income:Salary matched rule #0"))
        .stdout(contains(format!(" at {}:1\n", journal.path().display())));
}

#[test]
fn derive_as_json() {
    let journal = file(JOURNAL);
    let rules = file(RULES);
    let output = autoledger()
        .args(["derive", "--format", "json", "--rules"])
        .arg(rules.path())
        .arg(journal.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entry = &entries[0];
    assert_eq!(entry["line"], 8);
    assert_eq!(entry["pattern"], "Income:Salary");
    assert_eq!(entry["rule"], 0);
    assert_eq!(
        entry["definition"],
        format!("{}:1", rules.path().display()).as_str()
    );
    assert_eq!(entry["source"]["account"], "Income:Salary");
    assert_eq!(entry["postings"][0]["account"], "Assets:Savings");
}

#[test]
fn derive_rejects_broken_rules_file() {
    let journal = file(JOURNAL);
    let rules = file("= /Income(/\n    A  1\n    B  -1\n");
    autoledger()
        .arg("derive")
        .arg(journal.path())
        .arg("--rules")
        .arg(rules.path())
        .assert()
        .failure()
        .stderr(contains("invalid rule pattern"));
}

const UNALIGNED: &str = "\
2021/01/31 * Employer
    Assets:Checking
    Income:Salary  -1,000 EUR  ; pay
; untouched  1.00 EUR

2021/02/01 Grocer
    Expenses:Food        €12.50
\tAssets:Checking  €-12.50
";

fn point(line: &str) -> Option<usize> {
    line.chars().position(|c| c == '.')
}

#[test]
fn align_lines_up_posting_amounts() {
    let journal = file(UNALIGNED);
    let output = autoledger()
        .args(["align", "--dot-column", "30"])
        .arg(journal.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    let original: Vec<&str> = UNALIGNED.lines().collect();
    assert_eq!(lines.len(), original.len());

    for idx in [0, 1, 3, 4, 5] {
        assert_eq!(lines[idx], original[idx]);
    }
    assert_eq!(lines[2].find(" EUR"), Some(30), "{:?}", lines[2]);
    assert!(lines[2].starts_with("    Income:Salary "));
    assert!(lines[2].ends_with("-1,000 EUR  ; pay"));
    assert_eq!(point(lines[6]), Some(30), "{:?}", lines[6]);
    assert_eq!(point(lines[7]), Some(30), "{:?}", lines[7]);
    assert!(lines[7].starts_with("\tAssets:Checking "));
}

#[test]
fn align_can_rewrite_the_journal() {
    let journal = file(UNALIGNED);
    autoledger()
        .args(["align", "--dot-column", "30", "--write"])
        .arg(journal.path())
        .assert()
        .success()
        .stdout("");

    let rewritten = std::fs::read_to_string(journal.path()).unwrap();
    assert_ne!(rewritten, UNALIGNED);
    let line = rewritten.lines().nth(6).unwrap();
    assert_eq!(point(line), Some(30), "{:?}", line);

    // already aligned text is left as is
    autoledger()
        .args(["align", "--dot-column", "30"])
        .arg(journal.path())
        .assert()
        .success()
        .stdout(rewritten);
}

#[test]
fn list_declarations() {
    let journal = file(JOURNAL);
    autoledger()
        .args(["list", "accounts"])
        .arg(journal.path())
        .assert()
        .success()
        .stdout("Assets:Checking\nAssets:Savings\nIncome:Salary\n");

    autoledger()
        .args(["list", "accounts", "--search", "assets"])
        .arg(journal.path())
        .assert()
        .success()
        .stdout("Assets:Checking\nAssets:Savings\n");

    autoledger()
        .args(["list", "payees"])
        .arg(journal.path())
        .assert()
        .success()
        .stdout("Employer\n");
}

#[test]
fn missing_file_is_reported() {
    autoledger()
        .args(["check", "/nonexistent/journal.ledger"])
        .assert()
        .failure()
        .stderr(contains("failed to read /nonexistent/journal.ledger"));
}
