use anyhow::{Context, Result};
use callbridge_core::ClientOptions;
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct CheckArgs {
    /// Client options file (`.json` or `.toml`)
    pub file: PathBuf,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let options = check_file(&args.file)?;
    for line in summarize(&options) {
        println!("{}", line);
    }
    Ok(())
}

/// Parse and validate a client options file
pub fn check_file(path: &Path) -> Result<ClientOptions> {
    let options = ClientOptions::from_file(path)
        .with_context(|| format!("reading client options from {}", path.display()))?;
    options
        .validate()
        .with_context(|| format!("{} is not usable", path.display()))?;
    Ok(options)
}

fn summarize(options: &ClientOptions) -> Vec<String> {
    let init = &options.init_options;
    let auth = if init.login.is_some() {
        "login/password"
    } else if init.login_token.is_some() {
        "token"
    } else {
        "anonymous"
    };

    let policy = options.reconnect_policy();
    let reconnect = if policy.enabled {
        format!(
            "up to {} attempts, {} ms apart",
            policy.max_attempts,
            policy.delay.as_millis()
        )
    } else {
        "disabled".to_string()
    };

    vec![
        "Options OK".to_string(),
        format!("  auth:        {}", auth),
        format!("  environment: {:?}", init.env),
        format!("  reconnect:   {}", reconnect),
        format!("  auto answer: {}", options.auto_answer),
        format!("  media:       audio={} video={}", options.audio, options.video),
    ]
}
