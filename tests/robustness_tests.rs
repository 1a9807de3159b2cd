use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_malformed_input_handling() {
    let mut cmd = Command::new(cargo_bin!("konvert"));
    cmd.args(["eval", "2 + * 3"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unexpected character"));

    let mut cmd = Command::new(cargo_bin!("konvert"));
    cmd.args(["calc", "2^3"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown key"));
}

#[test]
fn test_invalid_amounts_and_currencies() {
    let mut cmd = Command::new(cargo_bin!("konvert"));
    cmd.args(["convert", "-5", "USD", "EUR", "--offline"]);
    cmd.assert().failure().stdout("");

    let mut cmd = Command::new(cargo_bin!("konvert"));
    cmd.args(["convert", "12abc", "USD", "EUR", "--offline"]);
    cmd.assert().failure().stdout("");

    let mut cmd = Command::new(cargo_bin!("konvert"));
    cmd.args(["convert", "1", "XYZ", "--offline"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("XYZ"));
}

#[test]
fn test_unreachable_rate_services_fall_back() {
    let mut cmd = Command::new(cargo_bin!("konvert"));
    cmd.args(["convert", "100", "USD", "EUR"])
        .env("KONVERT_CRYPTO_URL", "http://127.0.0.1:9/price")
        .env("KONVERT_FOREX_URL", "http://127.0.0.1:9/latest")
        .env("KONVERT_TIMEOUT_SECS", "2")
        .env("RUST_LOG", "warn");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("EUR,92.00"))
        .stderr(predicate::str::contains("using fallback rates"));
}

#[test]
fn test_invalid_settings_rejected() {
    let mut cmd = Command::new(cargo_bin!("konvert"));
    cmd.args(["convert", "1", "USD", "--forex-url", "ftp://rates"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not an http(s) URL"));
}

#[test]
fn test_deeply_nested_expression_is_rejected() {
    let nested = format!("{}1{}", "(".repeat(30_000), ")".repeat(30_000));

    let mut cmd = Command::new(cargo_bin!("konvert"));
    cmd.arg("eval").arg(&nested);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("nested too deeply"));

    let mut cmd = Command::new(cargo_bin!("konvert"));
    cmd.args(["eval", "--"]).arg(format!("{}5", "-".repeat(30_001)));
    cmd.assert().success().stdout("-5\n");
}
