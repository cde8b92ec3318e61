use desktop_ipc::config::{BACKEND_URL_VAR, DEV_MODE_VAR, DesktopConfig, SECRET_KEY_VAR};

use serial_test::serial;

fn set_vars(vars: &[(&str, &str)]) {
    for (key, value) in vars {
        // SAFETY: serialized with every other test touching the environment.
        unsafe { std::env::set_var(key, value) };
    }
}

fn clear_vars(keys: &[&str]) {
    for key in keys {
        // SAFETY: serialized with every other test touching the environment.
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
#[serial]
fn given_environment_overrides_when_loading_from_env_then_applied() {
    // GIVEN: Backend URL, secret and dev flag in the environment
    set_vars(&[
        (BACKEND_URL_VAR, "http://localhost:5005"),
        (SECRET_KEY_VAR, "env-secret"),
        (DEV_MODE_VAR, "true"),
    ]);

    // WHEN: Loading
    let config = DesktopConfig::from_env();
    clear_vars(&[BACKEND_URL_VAR, SECRET_KEY_VAR, DEV_MODE_VAR]);

    // THEN: Overrides win over defaults
    let config = config.expect("config should load");
    assert_eq!(config.backend_url, "http://localhost:5005");
    assert_eq!(config.secret_key.expose(), "env-secret");
    assert!(config.is_dev);
}

#[test]
#[serial]
fn given_invalid_environment_when_loading_from_env_then_error_mentions_variable() {
    set_vars(&[(DEV_MODE_VAR, "sometimes")]);

    let error = DesktopConfig::from_env();
    clear_vars(&[DEV_MODE_VAR]);

    let message = error.unwrap_err().to_string();
    assert!(message.contains("Config Parse Error"));
    assert!(message.contains(DEV_MODE_VAR));
}
