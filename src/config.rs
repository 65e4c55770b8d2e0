use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::net::{SocketAddr, IpAddr};
use std::default::Default;
use std::fmt::{Display, Formatter};

use clap::Parser;

use crate::error::{self, Context};
use crate::path::{metadata, normalize};

mod shape;

pub trait TryDefault: Sized {
    type Error;

    fn try_default() -> Result<Self, Self::Error>;
}

#[derive(Debug, Parser)]
#[command(author, version ,about, long_about = None)]
pub struct CliArgs {
    /// a config path or directory to load file from
    #[arg(long)]
    config: Vec<PathBuf>
}

#[derive(Debug)]
pub struct Config {
    pub settings: Settings,
}

pub fn get_config() -> error::Result<Config> {
    Config::from_args(CliArgs::parse())
}

impl Config {
    pub fn from_args(args: CliArgs) -> error::Result<Self> {
        let cwd = std::env::current_dir()
            .context("failed to retrieve cwd for Settings")?;
        let mut settings = Settings::try_default()?;

        for config_path in args.config {
            let full = if config_path.is_absolute() {
                config_path
            } else {
                normalize(cwd.join(config_path))
            };

            tracing::debug!("loading config file \"{}\"", full.display());

            let loaded = Self::load_file(&full)?;
            let src = SrcFile::new(&full)?;
            let dot = DotPath::new(&"settings");

            settings.merge(&src, dot, loaded)?;
        }

        if settings.listeners.is_empty() {
            settings.listeners.insert("main".into(), Listener::default());
        }

        {
            let meta = metadata(&settings.file.workspace_dir).context(
                "failed to retrieve metadata for settings.file.workspace_dir"
            )?.context(
                "settings.file.workspace_dir does not exist"
            )?;

            if !meta.is_dir() {
                return Err(error::Error::new().message(
                    "settings.file.workspace_dir is not a directory"
                ));
            }
        }

        if settings.file.root == settings.file.workspace_root {
            return Err(error::Error::new().message(
                "settings.file.root and settings.file.workspace_root cannot be the same"
            ));
        }

        tracing::debug!("{settings:#?}");

        Ok(Config {
            settings,
        })
    }

    fn load_file(path: &PathBuf) -> error::Result<shape::Settings> {
        let ext = path.extension().context(format!(
            "failed to retrieve the file extension for config file: \"{}\"", path.display()
        ))?;

        let ext = ext.to_ascii_lowercase();
        let file = std::fs::OpenOptions::new()
            .read(true)
            .open(path)
            .context(format!("failed to open config file: \"{}\"", path.display()))?;
        let reader = std::io::BufReader::new(file);

        if ext.eq("yaml") || ext.eq("yml") {
            serde_yaml::from_reader(reader).context(format!(
                "failed to parse yaml config file: \"{}\"", path.display()
            ))
        } else if ext.eq("json") {
            serde_json::from_reader(reader).context(format!(
                "failed to parse json config file: \"{}\"", path.display()
            ))
        } else {
            Err(error::Error::new().message(format!(
                "unknown type of config file: \"{}\"", path.display()
            )))
        }
    }
}

struct SrcFile<'a> {
    parent: &'a Path,
    src: &'a Path,
}

impl<'a> SrcFile<'a> {
    fn new(src: &'a Path) -> error::Result<Self> {
        let parent = src.parent().context(format!(
            "failed to retrieve parent path from source file \"{}\"", src.display()
        ))?;

        Ok(SrcFile {
            parent,
            src
        })
    }
}

impl<'a> Display for SrcFile<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.src.display())
    }
}

struct Quote<'a>(&'a dyn Display);

impl<'a> Display for Quote<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

struct DotPath<'a>(Vec<&'a dyn Display>);

impl<'a> DotPath<'a> {
    fn new(name: &'a (dyn Display)) -> Self {
        DotPath(vec![name])
    }

    fn push(&self, name: &'a (dyn Display)) -> Self {
        let mut path = self.0.clone();
        path.push(name);

        DotPath(path)
    }
}

impl<'a> Display for DotPath<'a> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;

        for name in &self.0 {
            if first {
                write!(fmt, "{name}")?;
                first = false;
            } else {
                write!(fmt, ".{name}")?;
            }
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct Settings {
    pub listeners: HashMap<String, Listener>,
    pub file: File,
    pub timeout: u64,
}

impl Settings {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, settings: shape::Settings) -> error::Result<()> {
        if let Some(listeners) = settings.listeners {
            for (key, listener) in listeners {
                if let Some(found) = self.listeners.get_mut(&key) {
                    found.merge(src, dot.push(&Quote(&key)), listener)?;
                } else {
                    let mut default = Listener::default();
                    default.merge(src, dot.push(&Quote(&key)), listener)?;

                    self.listeners.insert(key, default);
                }
            }
        }

        if let Some(file) = settings.file {
            self.file.merge(src, dot.push(&"file"), file)?;
        }

        if let Some(timeout) = settings.timeout {
            if timeout == 0 {
                return Err(error::Error::new().message(format!(
                    "{} must be greater than 0. file: {src}", dot.push(&"timeout")
                )));
            }

            self.timeout = timeout;
        }

        Ok(())
    }
}

impl TryDefault for Settings {
    type Error = error::Error;

    fn try_default() -> Result<Self, Self::Error> {
        Ok(Settings {
            listeners: HashMap::new(),
            file: File::try_default()?,
            timeout: 90,
        })
    }
}

#[derive(Debug)]
pub struct Listener {
    pub addr: SocketAddr,
}

impl Listener {
    fn merge(&mut self, src: &SrcFile<'_>, dot_path: DotPath<'_>, listener: shape::Listener) -> error::Result<()> {
        self.addr = match SocketAddr::from_str(&listener.addr) {
            Ok(valid) => valid,
            Err(_) => match IpAddr::from_str(&listener.addr) {
                Ok(valid) => SocketAddr::from((valid, 8080)),
                Err(_) => {
                    return Err(error::Error::new().message(format!(
                        "{dot_path}.addr invalid: \"{}\" file: {src}", listener.addr
                    )));
                }
            }
        };

        Ok(())
    }
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            addr: SocketAddr::from((
                IpAddr::from([0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0]),
                8080
            )),
        }
    }
}

#[derive(Debug)]
pub struct File {
    pub root: String,
    pub workspace_root: String,
    pub workspace_dir: PathBuf,
    pub max_depth: u32,
}

impl File {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, file: shape::File) -> error::Result<()> {
        if let Some(root) = file.root {
            self.root = check_url(root, src, dot.push(&"root"))?;
        }

        if let Some(workspace_root) = file.workspace_root {
            self.workspace_root = check_url(workspace_root, src, dot.push(&"workspace_root"))?;
        }

        if let Some(workspace_dir) = file.workspace_dir {
            self.workspace_dir = check_path(workspace_dir, src, dot.push(&"workspace_dir"), false)?;
        }

        if let Some(max_depth) = file.max_depth {
            self.max_depth = max_depth;
        }

        Ok(())
    }
}

impl TryDefault for File {
    type Error = error::Error;

    fn try_default() -> Result<Self, Self::Error> {
        let cwd = std::env::current_dir()
            .context("failed to retrieve cwd for File")?;

        Ok(File {
            root: "/file".into(),
            workspace_root: "/workspace".into(),
            workspace_dir: cwd.join("workspace"),
            max_depth: 1,
        })
    }
}

fn check_path(given: PathBuf, src: &SrcFile<'_>, dot: DotPath<'_>, is_file: bool) -> error::Result<PathBuf> {
    let full = if given.is_absolute() {
        given
    } else {
        normalize(src.parent.join(given))
    };

    tracing::debug!("{dot} {src} checking {}", full.display());

    let meta = metadata(&full).context(format!(
        "{dot} failed to retrieve metadata for: {src}"
    ))?.context(format!(
        "{dot} {src} was not found"
    ))?;

    if is_file {
        if !meta.is_file() {
            return Err(error::Error::new().message(format!(
                "{dot} is not a file in: {src}"
            )));
        }
    } else {
        if !meta.is_dir() {
            return Err(error::Error::new().message(format!(
                "{dot} is not a directory in: {src}"
            )));
        }
    }

    Ok(full)
}

fn check_url(given: String, src: &SrcFile<'_>, dot: DotPath<'_>) -> error::Result<String> {
    normalize_url_path(&given).context(format!(
        "{dot} \"{given}\" is not a valid url path. file: {src}"
    ))
}

/// validates a url path prefix. the result always has a leading slash and
/// never a trailing one
pub fn normalize_url_path(given: &str) -> Option<String> {
    let trimmed = given.trim().trim_end_matches('/');

    if trimmed.is_empty() {
        return None;
    }

    let to_parse = if trimmed.starts_with('/') {
        format!("http://localhost{trimmed}")
    } else {
        format!("http://localhost/{trimmed}")
    };

    let url = url::Url::parse(&to_parse).ok()?;

    if url.query().is_some() || url.fragment().is_some() {
        return None;
    }

    let mut rtn = String::new();

    for part in url.path_segments()? {
        if part.is_empty() || part == ".." || part == "." {
            return None;
        }

        rtn.push('/');
        rtn.push_str(part);
    }

    Some(rtn)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn url_path_normalization() {
        assert_eq!(normalize_url_path("/file").as_deref(), Some("/file"));
        assert_eq!(normalize_url_path("file/").as_deref(), Some("/file"));
        assert_eq!(normalize_url_path(" /api/file ").as_deref(), Some("/api/file"));

        let invalid = ["", "/", "/a//b", "/file?x=1", "/file#frag"];

        for test in invalid {
            assert!(normalize_url_path(test).is_none(), "invalid url path accepted {:?}", test);
        }
    }
}
