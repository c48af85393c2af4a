//! Print an Argon2id hash record for a password.
//!
//! Usage: `hash_password <password> [config.toml]`
//!
//! Parameters come from the `[argon2]` section of the given config file, or
//! the defaults when none is given. The output can be stored directly in
//! `users.password_hash`.

use auth_service::{Argon2Hasher, Config};

fn main() {
    let mut args = std::env::args().skip(1);

    let Some(password) = args.next() else {
        eprintln!("Usage: hash_password <password> [config.toml]");
        std::process::exit(2);
    };

    let config = match args.next() {
        Some(path) => match Config::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {path}: {e}");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    let hasher = match Argon2Hasher::new(config.hash_params()) {
        Ok(hasher) => hasher,
        Err(e) => {
            eprintln!("Invalid Argon2 parameters: {e}");
            std::process::exit(1);
        }
    };

    match hasher.hash(&password) {
        Ok(record) => println!("{record}"),
        Err(e) => {
            eprintln!("Failed to hash password: {e}");
            std::process::exit(1);
        }
    }
}
