//! Settings for the built-in front-end tasks
//!
//! Every section has defaults matching the conventional project layout
//! (`src/` compiled into `build/`), so a project without a `sluice.yml` builds
//! as-is.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct PathsConfig {
    pub build: BuildPaths,
    pub src: SourcePaths,
    pub watch: WatchPaths,
    /// Directory removed by the `clean` task.
    pub clean: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            build: BuildPaths::default(),
            src: SourcePaths::default(),
            watch: WatchPaths::default(),
            clean: "./build".to_string(),
        }
    }
}

/// Output directories
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct BuildPaths {
    pub js: String,
    pub js_vendor: String,
    pub css: String,
    pub assets: String,
    pub img: String,
}

impl Default for BuildPaths {
    fn default() -> Self {
        Self {
            js: "build/js/".to_string(),
            js_vendor: "build/js/vendor/".to_string(),
            css: "build/css/".to_string(),
            assets: "build/assets/".to_string(),
            img: "build/img".to_string(),
        }
    }
}

/// Source globs read by the build tasks
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SourcePaths {
    /// Bundle entry point.
    pub js: String,
    pub js_vendor: String,
    /// Stylesheet entry point.
    pub css: String,
    pub assets: String,
    pub svg: String,
    pub img: String,
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            js: "src/js/main.js".to_string(),
            js_vendor: "src/js/vendor/**/*.*".to_string(),
            css: "src/css/main.scss".to_string(),
            assets: "src/assets/**".to_string(),
            svg: "src/svg/*.svg".to_string(),
            img: "src/img/**/*.*".to_string(),
        }
    }
}

/// Globs the `watch` task binds to the build tasks
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct WatchPaths {
    pub js: String,
    pub css: String,
    pub assets: String,
    pub svg: String,
    pub img: String,
}

impl Default for WatchPaths {
    fn default() -> Self {
        Self {
            js: "src/js/**/*.js".to_string(),
            css: "src/css/**/*.scss".to_string(),
            assets: "src/assets/**".to_string(),
            svg: "src/svg/*.svg".to_string(),
            img: "src/img/**/*.*".to_string(),
        }
    }
}

/// An external program invoked by a collaborator.
///
/// `{file}`, `{entry}`, `{library}` and `{publicPath}` in arguments are
/// replaced before the program runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra arguments when source maps are wanted (development).
    #[serde(default)]
    pub source_map_args: Vec<String>,
    /// Extra arguments when output should be minified (production).
    #[serde(default)]
    pub minify_args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            source_map_args: Vec::new(),
            minify_args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Arguments for one invocation, with placeholders substituted
    pub fn arguments(&self, source_maps: bool, minify: bool, vars: &[(&str, &str)]) -> Vec<String> {
        let mut args: Vec<&String> = self.args.iter().collect();
        if source_maps {
            args.extend(&self.source_map_args);
        }
        if minify {
            args.extend(&self.minify_args);
        }
        args.into_iter()
            .map(|arg| {
                vars.iter().fold(arg.clone(), |acc, (key, value)| {
                    acc.replace(&format!("{{{}}}", key), value)
                })
            })
            .collect()
    }
}

/// External tools used by the build tasks
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ToolsConfig {
    /// Reads the stylesheet on stdin, writes CSS to stdout.
    pub style_compiler: ToolCommand,
    /// Writes the bundled script to stdout; stderr output is reported as warnings.
    pub bundler: ToolCommand,
    /// Reads an image on stdin, writes the optimized image to stdout.
    /// Images are copied unchanged when unset.
    pub image_optimizer: Option<ToolCommand>,
    /// Browser targets handed to the style compiler.
    pub browsers: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            style_compiler: ToolCommand {
                program: "sass".to_string(),
                args: vec!["--stdin".to_string(), "--load-path=src/css".to_string()],
                source_map_args: vec!["--embed-source-map".to_string()],
                minify_args: vec!["--style=compressed".to_string(), "--no-source-map".to_string()],
            },
            bundler: ToolCommand {
                program: "esbuild".to_string(),
                args: vec![
                    "{entry}".to_string(),
                    "--bundle".to_string(),
                    "--format=iife".to_string(),
                    "--global-name={library}".to_string(),
                    "--public-path={publicPath}".to_string(),
                    "--log-level=warning".to_string(),
                ],
                source_map_args: vec!["--sourcemap=inline".to_string()],
                minify_args: vec!["--minify".to_string()],
            },
            image_optimizer: None,
            browsers: vec!["> 1%".to_string(), "IE 7".to_string()],
        }
    }
}

/// Options for the `js:bundle` task
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct BundleConfig {
    /// Global variable the bundle is exposed as.
    pub library: String,
    pub public_path: String,
    /// File name written under the script output directory.
    pub output: String,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            library: "Main".to_string(),
            public_path: "/js/".to_string(),
            output: "main.js".to_string(),
        }
    }
}

/// Development server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ServerConfig {
    /// Backend the server proxies.
    pub proxy: String,
    pub host: String,
    pub port: u16,
    /// Changes to these files trigger a browser reload.
    pub watch: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            proxy: "localhost/tiu/".to_string(),
            host: "localhost".to_string(),
            port: 9000,
            watch: vec![
                "build/**/*.*".to_string(),
                "*.php".to_string(),
                "**/*.php".to_string(),
            ],
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct WatchConfig {
    /// Debounce window in milliseconds.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}
