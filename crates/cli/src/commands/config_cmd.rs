//! `ragwise config`: Print the default configuration.

use ragwise_config::AppConfig;

pub fn print_default() {
    println!(
        "# Save as {}",
        AppConfig::config_dir().join("config.toml").display()
    );
    println!("{}", AppConfig::default_toml());
}
