use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use chrono::{Duration, Utc};
use predicates::prelude::*;

fn roamguard() -> Command {
    cargo_bin_cmd!("roamguard")
}

fn init(dir: &assert_fs::TempDir) {
    roamguard()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
}

/// Seed a profile document the way the file store writes it.
fn seed_user(dir: &assert_fs::TempDir, uid: &str, username: &str, email: &str, role: &str) {
    let now = Utc::now().to_rfc3339();
    let profile = serde_json::json!({
        "user_id": uid,
        "username": username,
        "email": email,
        "role": role,
        "email_verified": true,
        "profile_pic": "https://via.placeholder.com/150",
        "created_at": now,
        "updated_at": now,
    });
    let mut users = serde_json::Map::new();
    users.insert(uid.to_string(), profile);
    std::fs::write(
        dir.path().join(".roamguard/users.json"),
        serde_json::to_string_pretty(&users).unwrap(),
    )
    .unwrap();
}

// ─── Login fail-fast paths (no provider contact) ─────────────────

#[test]
fn login_rejects_malformed_email_before_anything_else() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    roamguard()
        .current_dir(dir.path())
        .args(["login", "not-an-email"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid email address"));

    // Nothing was recorded anywhere.
    assert!(!dir.path().join(".roamguard/lockouts.json").exists());
}

#[test]
fn unknown_account_gets_the_generic_message_and_no_lockout_state() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    for _ in 0..4 {
        roamguard()
            .current_dir(dir.path())
            .args(["login", "ghost@x.com"])
            .write_stdin("whatever\n")
            .assert()
            .success()
            .stderr(predicate::str::contains("No such user found"));
    }

    // Repeated unknown-account submissions never decrease the allowance.
    roamguard()
        .current_dir(dir.path())
        .args(["lockout", "ghost@x.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 of 3 attempts remaining"));

    assert!(!dir.path().join(".roamguard/lockouts.json").exists());
}

#[test]
fn unknown_account_attempts_still_land_in_the_audit_trail() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    roamguard()
        .current_dir(dir.path())
        .args(["login", "ghost@x.com"])
        .write_stdin("whatever\n")
        .assert()
        .success();

    let content = std::fs::read_to_string(dir.path().join(".roamguard/audit.log")).unwrap();
    assert!(content.contains("\"action\":\"USER_LOGIN_FAILED\""));
    assert!(content.contains("unknown_account"));
    assert!(content.contains("\"success\":false"));
}

// ─── Lockout enforcement ─────────────────────────────────────────

/// Write a locked record directly, as three failed attempts would.
fn seed_locked(dir: &assert_fs::TempDir, email: &str, until: chrono::DateTime<Utc>) {
    let record = serde_json::json!({
        "account_id": email,
        "attempts": 3,
        "first_attempt_at": (Utc::now() - Duration::seconds(300)).to_rfc3339(),
        "last_attempt_at": (Utc::now() - Duration::seconds(60)).to_rfc3339(),
        "locked_until": until.to_rfc3339(),
    });
    let mut map = serde_json::Map::new();
    map.insert(
        format!("lockout_{email}"),
        serde_json::Value::String(serde_json::to_string(&record).unwrap()),
    );
    std::fs::write(
        dir.path().join(".roamguard/lockouts.json"),
        serde_json::to_string_pretty(&map).unwrap(),
    )
    .unwrap();
}

#[test]
fn locked_account_is_rejected_before_the_password_prompt() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);
    seed_user(&dir, "u1", "alice", "a@x.com", "user");
    // Lock expires in ~2s so the countdown finishes quickly.
    seed_locked(&dir, "a@x.com", Utc::now() + Duration::seconds(2));

    roamguard()
        .current_dir(dir.path())
        .args(["login", "a@x.com"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Account is locked"));
}

#[test]
fn lockout_command_shows_the_locked_state() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);
    seed_locked(&dir, "a@x.com", Utc::now() + Duration::seconds(90));

    roamguard()
        .current_dir(dir.path())
        .args(["lockout", "a@x.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Locked"))
        .stdout(predicate::str::contains("Failed attempts: 3"));
}

#[test]
fn expired_lock_resets_on_observation() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);
    seed_locked(&dir, "a@x.com", Utc::now() - Duration::seconds(5));

    // The observing read reports unlocked and deletes the stale record.
    roamguard()
        .current_dir(dir.path())
        .args(["lockout", "a@x.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not locked"));

    let content = std::fs::read_to_string(dir.path().join(".roamguard/lockouts.json")).unwrap();
    assert!(!content.contains("lockout_a@x.com"));

    // The next read sees the full allowance again.
    roamguard()
        .current_dir(dir.path())
        .args(["lockout", "a@x.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 of 3 attempts remaining"))
        .stdout(predicate::str::contains("Failed attempts: 0"));
}

#[test]
fn lockout_of_a_clean_account_shows_full_allowance() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    roamguard()
        .current_dir(dir.path())
        .args(["lockout", "new@x.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not locked"))
        .stdout(predicate::str::contains("Failed attempts: 0"));
}

// ─── Register fail-fast paths ────────────────────────────────────

#[test]
fn register_rejects_weak_password_locally() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    roamguard()
        .current_dir(dir.path())
        .args(["register", "a@x.com", "alice"])
        .write_stdin("short\nshort\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("security requirements"));

    // Fail-fast means no profile document and no audit entry.
    assert!(!dir.path().join(".roamguard/users.json").exists());
    let trail = std::fs::read_to_string(dir.path().join(".roamguard/audit.log")).unwrap();
    assert!(!trail.contains("USER_REGISTRATION"));
}

#[test]
fn register_rejects_mismatched_passwords() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    roamguard()
        .current_dir(dir.path())
        .args(["register", "a@x.com", "alice"])
        .write_stdin("Aa1!aa\nBb2@bb\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Passwords do not match"));
}

#[test]
fn register_rejects_malformed_email() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    roamguard()
        .current_dir(dir.path())
        .args(["register", "nope", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid email address"));
}
