use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use css_cachebuster::{BustType, Cachebuster, CachebusterConfig};

/// Append cache-busting tokens to the asset references of a stylesheet.
#[derive(Parser, Debug)]
#[command(name = "css-cachebuster", version)]
struct Args {
  /// Stylesheet to rewrite, `-` for stdin.
  input: PathBuf,
  /// Output file. Defaults to stdout.
  #[arg(short, long)]
  output: Option<PathBuf>,
  /// JSON configuration file. Defaults to `cachebuster.config.json` in the working directory.
  #[arg(short, long)]
  config: Option<PathBuf>,
  /// Directory the base paths are relative to. Defaults to the working directory.
  #[arg(long)]
  root: Option<PathBuf>,
  /// Base directory for relative references.
  #[arg(long)]
  css_path: Option<PathBuf>,
  /// Base directory for references starting with `/`.
  #[arg(long)]
  images_path: Option<PathBuf>,
  /// Use a content digest instead of the modification time.
  #[arg(long)]
  checksum: bool,
  /// Digest used with `--checksum`.
  #[arg(long)]
  hash_algorithm: Option<String>,
  /// Query parameter prefix placed before the token.
  #[arg(long)]
  param_name: Option<String>,
  /// Additional property whose `url(...)` values are rewritten. Repeatable.
  #[arg(long = "additional-prop", value_name = "PROPERTY")]
  additional_props: Vec<String>,
}

impl Args {
  fn load_config(&self) -> Result<CachebusterConfig> {
    let mut config = match &self.config {
      Some(path) => CachebusterConfig::from_path(path)?,
      None => {
        let cwd = std::env::current_dir().context("failed to read working directory")?;
        CachebusterConfig::discover(&cwd)
      }
    };

    if let Some(path) = &self.root {
      config.root = Some(path.clone());
    }
    if let Some(path) = &self.css_path {
      config.css_path = Some(path.clone());
    }
    if let Some(path) = &self.images_path {
      config.images_path = Some(path.clone());
    }
    if self.checksum {
      config.bust_type = BustType::Checksum;
    }
    if let Some(algorithm) = &self.hash_algorithm {
      config.hash_algorithm = algorithm.clone();
    }
    if let Some(param_name) = &self.param_name {
      config.param_name = param_name.clone();
    }
    config
      .additional_props
      .extend(self.additional_props.iter().cloned());

    Ok(config)
  }

  fn read_input(&self) -> Result<String> {
    if self.input.as_os_str() == "-" {
      let mut css = String::new();
      io::stdin()
        .read_to_string(&mut css)
        .context("failed to read stylesheet from stdin")?;
      return Ok(css);
    }

    fs::read_to_string(&self.input)
      .with_context(|| format!("failed to read {}", self.input.display()))
  }
}

fn main() -> Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

  let args = Args::parse();
  let config = args.load_config()?;
  let buster = Cachebuster::new(config)?;

  let css = args.read_input()?;
  let (rewritten, report) = if args.input.as_os_str() == "-" {
    buster.process_css(&css)?
  } else {
    buster.process_css_source(&css, &args.input)?
  };

  log::info!(
    "rewrote {} reference(s), {} unresolved",
    report.rewritten_count(),
    report.unresolved().count()
  );

  match &args.output {
    Some(path) => {
      if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
          .with_context(|| format!("failed to create {}", parent.display()))?;
      }
      fs::write(path, rewritten).with_context(|| format!("failed to write {}", path.display()))?;
    }
    None => io::stdout()
      .write_all(rewritten.as_bytes())
      .context("failed to write stylesheet to stdout")?,
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn flags_override_config_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("cachebuster.json");
    fs::write(
      &config_path,
      r#"{ "imagesPath": "static", "hashAlgorithm": "sha1", "additionalProps": ["mask"] }"#,
    )
    .unwrap();

    let args = Args::try_parse_from([
      "css-cachebuster",
      "site.css",
      "--config",
      config_path.to_str().unwrap(),
      "--images-path",
      "public",
      "--root",
      "site",
      "--checksum",
      "--additional-prop",
      "mask-image",
    ])
    .unwrap();
    let config = args.load_config().unwrap();

    assert_eq!(config.images_path, Some(PathBuf::from("public")));
    assert_eq!(config.root, Some(PathBuf::from("site")));
    assert_eq!(config.bust_type, BustType::Checksum);
    assert_eq!(config.hash_algorithm, "sha1");
    assert_eq!(config.additional_props, vec![
      "mask".to_string(),
      "mask-image".to_string()
    ]);
  }

  #[test]
  fn missing_config_file_is_an_error() {
    let args =
      Args::try_parse_from(["css-cachebuster", "site.css", "--config", "does/not/exist.json"])
        .unwrap();
    assert!(args.load_config().is_err());
  }
}
