//! [`DiagramRenderer`] backed by the `mmdc` command-line renderer.

use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use diagram_engine::{DiagramRenderer, EngineError};
use log::{debug, warn};
use wait_timeout::ChildExt;

pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

const CONFIG_FILE_NAME: &str = "mermaid-config.json";
const THEME_CONFIG: &str = r#"{
  "theme": "neutral",
  "flowchart": { "htmlLabels": false, "curve": "basis" },
  "securityLevel": "strict"
}
"#;

#[derive(Debug, Clone)]
pub struct MermaidCliRenderer {
    program: PathBuf,
    output_dir: PathBuf,
    timeout: Duration,
}

impl MermaidCliRenderer {
    pub fn new(program: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            output_dir: output_dir.into(),
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where the markup for render `id` is written.
    pub fn output_path(&self, id: &str) -> PathBuf {
        self.output_dir.join(format!("{id}.svg"))
    }

    fn input_path(&self, id: &str) -> PathBuf {
        self.output_dir.join(format!("{id}.mmd"))
    }

    fn config_path(&self) -> PathBuf {
        self.output_dir.join(CONFIG_FILE_NAME)
    }

    fn run(&self, input: &Path, output: &Path) -> Result<(), EngineError> {
        let mut child = Command::new(&self.program)
            .arg("-i")
            .arg(input)
            .arg("-o")
            .arg(output)
            .arg("-c")
            .arg(self.config_path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| match error.kind() {
                ErrorKind::NotFound => EngineError::Unavailable(format!(
                    "{} was not found",
                    self.program.display()
                )),
                _ => EngineError::Io(error),
            })?;

        // Drained on a thread so a full pipe cannot stall the child. After a
        // timeout the reader is detached and ends once the pipe closes.
        let reader = child.stderr.take().map(drain_stderr);
        let status = self.wait(&mut child)?;
        let stderr = reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();

        if status.success() {
            return Ok(());
        }

        let stderr = stderr.trim();
        Err(EngineError::Rejected(if stderr.is_empty() {
            format!("renderer exited with {status}")
        } else {
            stderr.to_string()
        }))
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, EngineError> {
        match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => Ok(status),
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(EngineError::Timeout(self.timeout))
            }
            Err(error) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(EngineError::Io(error))
            }
        }
    }
}

fn drain_stderr(mut pipe: ChildStderr) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        let _ = pipe.read_to_end(&mut bytes);
        String::from_utf8_lossy(&bytes).into_owned()
    })
}

impl DiagramRenderer for MermaidCliRenderer {
    fn configure(&self) -> Result<(), EngineError> {
        fs::create_dir_all(&self.output_dir)?;
        fs::write(self.config_path(), THEME_CONFIG)?;
        Ok(())
    }

    fn render(&self, id: &str, source: &str) -> Result<String, EngineError> {
        let input = self.input_path(id);
        let output = self.output_path(id);
        fs::write(&input, source)?;

        debug!("rendering diagram {id} with {}", self.program.display());
        let result = self.run(&input, &output);
        if let Err(error) = fs::remove_file(&input) {
            warn!("could not remove {}: {error}", input.display());
        }

        result?;
        Ok(fs::read_to_string(&output)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn configure_writes_theme_config() {
        let dir = TempDir::new().expect("temp dir");
        let renderer = MermaidCliRenderer::new("mmdc", dir.path().join("out"));

        renderer.configure().expect("configure");

        let written = fs::read_to_string(dir.path().join("out").join(CONFIG_FILE_NAME))
            .expect("config written");
        assert!(written.contains("\"theme\""));
    }

    #[test]
    fn missing_program_is_unavailable() {
        let dir = TempDir::new().expect("temp dir");
        let renderer =
            MermaidCliRenderer::new(dir.path().join("no-such-mmdc"), dir.path().to_path_buf());
        renderer.configure().expect("configure");

        let error = renderer
            .render("diagram-test", "graph TD\nA-->B")
            .expect_err("program is missing");
        assert!(matches!(error, EngineError::Unavailable(_)));
    }

    #[cfg(unix)]
    fn write_script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-mmdc");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("script written");
        let mut permissions = fs::metadata(&path).expect("metadata").permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&path, permissions).expect("chmod");
        path
    }

    #[cfg(unix)]
    #[test]
    fn renders_through_the_subprocess() {
        let dir = TempDir::new().expect("temp dir");
        // Arguments arrive as: -i <input> -o <output> -c <config>.
        let script = write_script(dir.path(), r#"printf '<svg>%s</svg>' "$(cat "$2")" > "$4""#);
        let renderer = MermaidCliRenderer::new(script, dir.path().join("out"));
        renderer.configure().expect("configure");

        let markup = renderer
            .render("diagram-abc", "graph TD")
            .expect("rendered");

        assert_eq!(markup, "<svg>graph TD</svg>");
        assert!(renderer.output_path("diagram-abc").exists());
        assert!(!renderer.input_path("diagram-abc").exists());
    }

    #[cfg(unix)]
    #[test]
    fn verbose_stderr_does_not_stall_the_render() {
        let dir = TempDir::new().expect("temp dir");
        let script = write_script(
            dir.path(),
            r#"head -c 262144 /dev/zero | tr '\0' 'x' >&2; printf '<svg/>' > "$4""#,
        );
        let renderer = MermaidCliRenderer::new(script, dir.path().join("out"))
            .with_timeout(Duration::from_secs(10));
        renderer.configure().expect("configure");

        let markup = renderer.render("diagram-loud", "graph").expect("rendered");

        assert_eq!(markup, "<svg/>");
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_reports_stderr() {
        let dir = TempDir::new().expect("temp dir");
        let script = write_script(dir.path(), "echo 'Parse error on line 1' >&2; exit 1");
        let renderer = MermaidCliRenderer::new(script, dir.path().join("out"));
        renderer.configure().expect("configure");

        let error = renderer.render("diagram-x", "graph").expect_err("rejected");
        assert!(
            matches!(error, EngineError::Rejected(ref message) if message.contains("Parse error"))
        );
        assert!(!renderer.input_path("diagram-x").exists());
    }

    #[cfg(unix)]
    #[test]
    fn slow_renders_time_out() {
        let dir = TempDir::new().expect("temp dir");
        let script = write_script(dir.path(), "sleep 5");
        let renderer = MermaidCliRenderer::new(script, dir.path().join("out"))
            .with_timeout(Duration::from_millis(100));
        renderer.configure().expect("configure");

        let error = renderer.render("diagram-y", "graph").expect_err("timed out");
        assert!(matches!(error, EngineError::Timeout(_)));
    }
}
