//! End-to-end runs of the `flama` binary against temporary files.

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn flama(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flama"))
        .args(args)
        .current_dir(dir.path())
        .env("FLAMA_DATABASE_PATH", dir.path().join("flama.db"))
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run flama")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

const RULES: &str = r#"[
    {"product_id": "P13", "deposit_id": "centro", "mode": "simple", "price": 110},
    {"produto_id": "P13", "deposito_id": "norte", "modalidade": "simples", "preco": "95,50"},
    {"productId": "P13", "mode": "troca", "exchangePrice": 80}
]"#;

// =============================================================================
// price --rules
// =============================================================================

#[test]
fn test_price_from_rules_file() {
    let dir = TempDir::new().unwrap();
    let rules = write(&dir, "rules.json", RULES);

    let out = flama(&dir, &["price", "-p", "P13", "-d", "centro", "--rules", &rules]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "P13 @ centro (simple): R$110,00  [deposit-exact]");

    let out = flama(&dir, &["price", "-p", "P13", "--rules", &rules]);
    assert!(stdout(&out).contains("R$95,50  [global-min]"));

    // No database file is created when rules come from a file
    assert!(!dir.path().join("flama.db").exists());
}

#[test]
fn test_price_json_output() {
    let dir = TempDir::new().unwrap();
    let rules = write(&dir, "rules.json", RULES);

    let out = flama(
        &dir,
        &["--json", "price", "-p", "P13", "-d", "centro", "-m", "troca", "--rules", &rules],
    );
    assert!(out.status.success());

    let view: Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(view["mode"], "exchange");
    assert_eq!(view["price_cents"], 11000);
    assert_eq!(view["source"], "deposit-simple-fallback");
}

#[test]
fn test_unknown_product_prices_at_zero() {
    let dir = TempDir::new().unwrap();
    let rules = write(&dir, "rules.json", RULES);

    let out = flama(&dir, &["price", "-p", "P99", "--rules", &rules]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("R$0,00  [unmatched]"));
}

#[test]
fn test_blank_product_is_a_validation_error() {
    let dir = TempDir::new().unwrap();
    let rules = write(&dir, "rules.json", RULES);

    let out = flama(&dir, &["--json", "price", "-p", "  ", "--rules", &rules]);
    assert_eq!(out.status.code(), Some(2));

    // Errors go to stderr, as JSON under --json
    let err: Value = serde_json::from_str(String::from_utf8_lossy(&out.stderr).trim()).unwrap();
    assert_eq!(err["code"], "VALIDATION_ERROR");
}

#[test]
fn test_missing_rules_file_is_an_input_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.json");

    let out = flama(&dir, &["price", "-p", "P13", "--rules", &missing.to_string_lossy()]);
    assert_eq!(out.status.code(), Some(6));
}

// =============================================================================
// legacy purge-queue
// =============================================================================

const DUMP: &str = r#"{
    "offline_queue": "[{\"op\":\"insert\"}]",
    "sync_pending": "3",
    "theme": "dark",
    "precos": "[]"
}"#;

#[test]
fn test_purge_queue_dry_run_leaves_file_alone() {
    let dir = TempDir::new().unwrap();
    let dump = write(&dir, "dump.json", DUMP);

    let out = flama(&dir, &["legacy", "purge-queue", &dump, "--dry-run"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("Would remove 2 key(s)"));
    assert!(text.contains("offline_queue"));
    assert!(text.contains("sync_pending"));

    assert_eq!(std::fs::read_to_string(&dump).unwrap(), DUMP);
}

#[test]
fn test_purge_queue_removes_keys_once() {
    let dir = TempDir::new().unwrap();
    let dump = write(&dir, "dump.json", DUMP);

    let out = flama(&dir, &["--json", "legacy", "purge-queue", &dump]);
    assert!(out.status.success());
    let view: Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(view["removed"], serde_json::json!(["offline_queue", "sync_pending"]));
    assert_eq!(view["dryRun"], false);

    let purged = read_json(Path::new(&dump));
    assert!(purged.get("offline_queue").is_none());
    assert!(purged.get("sync_pending").is_none());
    assert_eq!(purged["theme"], "dark");
    assert_eq!(purged["precos"], "[]");

    let out = flama(&dir, &["legacy", "purge-queue", &dump]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("No offline queue keys"));
}

// =============================================================================
// Database round trip
// =============================================================================

const STORE: &str = r#"{
    "depositos": [{"id": "centro", "nome": "Centro"}, {"id": "norte", "nome": "Norte"}],
    "produtos": [{"id": "P13", "nome": "Botijao 13kg", "unidade": "un"}],
    "clientes": [{"id": "c1", "nome": "Maria", "cpf_cnpj": "123.456.789-09"}],
    "precos": [
        {"produto_id": "P13", "preco": 110},
        {"produto_id": "P13", "deposito_id": "norte", "preco": 100}
    ]
}"#;

#[test]
fn test_import_then_price_and_order() {
    let dir = TempDir::new().unwrap();
    let store = write(&dir, "store.json", STORE);

    let out = flama(&dir, &["--json", "legacy", "import", &store]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let view: Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(view["imported"], 6);
    assert_eq!(view["skipped"], 0);

    let out = flama(&dir, &["price", "-p", "P13", "-d", "norte"]);
    assert!(stdout(&out).contains("R$100,00  [deposit-exact]"));

    let out = flama(&dir, &["rules", "set", "-p", "P13", "-d", "norte", "-m", "simples", "--price", "90"]);
    assert!(stdout(&out).starts_with("Updated simple override for P13 at norte"));

    let out = flama(
        &dir,
        &["--json", "orders", "create", "-d", "norte", "-c", "c1", "-i", "P13:2"],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let order: Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(order["totalCents"], 18000);
    assert_eq!(order["status"], "pending");
    let id = order["id"].as_str().unwrap().to_string();

    let out = flama(&dir, &["orders", "status", &id, "entregue"]);
    assert!(stdout(&out).contains("is now delivered"));

    // Delivered orders are final
    let out = flama(&dir, &["orders", "status", &id, "cancelled"]);
    assert_eq!(out.status.code(), Some(4));
}

#[test]
fn test_rules_set_rejects_unknown_mode() {
    let dir = TempDir::new().unwrap();

    let out = flama(&dir, &["rules", "set", "-p", "P13", "-m", "atacado", "--price", "10"]);
    assert!(!out.status.success());
    assert!(!dir.path().join("flama.db").exists());
}

#[test]
fn test_rules_set_refuses_dot_grouped_price() {
    let dir = TempDir::new().unwrap();

    let out = flama(&dir, &["rules", "set", "-p", "P13", "-m", "simples", "--price", "1.500"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("1.500,00"));
    assert!(!dir.path().join("flama.db").exists());
}
