//! Shared fixtures for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared helpers under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/fixtures.rs"]
//! mod fixtures;
//! ```

use camino::Utf8PathBuf;
use cap_std::{ambient_authority, fs_utf8::Dir};
use selectel_machine::test_support::ScriptedCloud;
use selectel_machine::{Driver, DriverConfig, MachineRecord, PollConfig};
use tempfile::TempDir;

/// Public key written next to the private key.
pub const PUBLIC_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIFixture builder@test";

/// Temporary directory holding `id_ed25519` and `id_ed25519.pub`.
pub struct KeyDir {
    _tmp: TempDir,
    pub private_key: Utf8PathBuf,
}

/// Creates a key directory; the private key content is irrelevant.
pub fn key_dir() -> KeyDir {
    let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    let root =
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap_or_else(|non_utf8_path| {
            panic!("temp dir should be utf8: {}", non_utf8_path.display())
        });
    let dir = Dir::open_ambient_dir(&root, ambient_authority())
        .unwrap_or_else(|err| panic!("open temp dir: {err}"));
    dir.write("id_ed25519", "private key material")
        .unwrap_or_else(|err| panic!("write private key: {err}"));
    dir.write("id_ed25519.pub", format!("{PUBLIC_KEY}\n"))
        .unwrap_or_else(|err| panic!("write public key: {err}"));

    KeyDir {
        private_key: root.join("id_ed25519"),
        _tmp: tmp,
    }
}

/// Configuration that passes validation once defaults are applied.
pub fn valid_config(keys: &KeyDir) -> DriverConfig {
    DriverConfig {
        auth_url: String::from("https://api.selvpc.ru/identity/v3"),
        domain_name: String::from("12345"),
        username: String::from("builder"),
        password: String::from("secret"),
        project_id: String::from("project"),
        availability_zone: String::from("ru-1a"),
        network_id: String::from("net-1"),
        ssh_private_key_path: keys.private_key.clone(),
        ..DriverConfig::default()
    }
}

/// Polling with the default budget and millisecond intervals.
pub fn fast_polling() -> PollConfig {
    PollConfig {
        volume_interval_ms: 1,
        server_interval_ms: 1,
        ..PollConfig::standard()
    }
}

/// Driver over a fresh record built from `config`.
pub fn driver_for(config: DriverConfig, cloud: &ScriptedCloud) -> Driver<ScriptedCloud> {
    let record = MachineRecord::from_flags("builder", config)
        .unwrap_or_else(|err| panic!("valid config: {err}"));
    Driver::new(record, cloud.clone()).with_polling(fast_polling())
}

/// Record of a machine whose server and volume already exist.
pub fn provisioned_record() -> MachineRecord {
    MachineRecord {
        machine_name: String::from("builder"),
        config: DriverConfig {
            project_id: String::from("project"),
            flavor_id: String::from("flv-9"),
            ..DriverConfig::default()
        },
        server_id: Some(String::from("srv-1")),
        volume_id: Some(String::from("vol-1")),
        ip_address: None,
        flavor_created: false,
        key_pair_created: false,
    }
}
