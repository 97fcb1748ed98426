//! Development certificate creation through PowerShell.

use super::runner::ToolRunner;
use super::tools::path_arg;
use crate::error::{ErrorExt, Result};
use crate::logger::PackagingLogger;
use crate::program::ProgramOptions;
use crate::utils::fs::write_file;
use crate::utils::remove_publisher_prefix;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::{Path, PathBuf};

const DEV_CERT_TEMPLATE: &str = include_str!("../../templates/create_dev_cert.ps1.hbs");

/// Name of the generated script inside the output directory.
pub const DEV_CERT_SCRIPT: &str = "create_dev_cert.ps1";

#[derive(Serialize)]
struct DevCertTemplate {
    subject_name: String,
    password: String,
    pfx_output_path: String,
    cer_output_path: String,
}

/// Locates PowerShell 7, falling back to `pwsh.exe` on `PATH` at spawn time.
fn pwsh() -> PathBuf {
    which::which("pwsh").unwrap_or_else(|_| PathBuf::from("pwsh.exe"))
}

/// Runs a `.ps1` script, or any other string as `-Command`, and returns stdout.
pub async fn powershell<R: ToolRunner>(
    runner: &R,
    script_or_command: &str,
    logger: &PackagingLogger,
) -> Result<String> {
    logger.debug_with(
        "Running powershell command",
        &serde_json::json!({ "commandAndArgs": script_or_command }),
    );
    let mut args = vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
    ];
    if !script_or_command.ends_with(".ps1") {
        args.push("-Command".to_string());
    }
    args.push(script_or_command.to_string());

    let result = runner.run(&pwsh(), &args).await?.join("\n");
    logger.debug_with("Powershell command result", &serde_json::json!({ "result": result }));
    Ok(result)
}

/// Renders the certificate script for `program`.
pub fn render_dev_cert_script(program: &ProgramOptions) -> Result<String> {
    let data = DevCertTemplate {
        subject_name: quote(remove_publisher_prefix(&program.publisher)),
        password: quote(&program.cert_pass),
        pfx_output_path: quote(&optional_path(program.cert_pfx.as_deref())),
        cer_output_path: quote(&optional_path(program.cert_cer.as_deref())),
    };

    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.register_template_string("dev_cert", DEV_CERT_TEMPLATE)?;
    Ok(handlebars.render("dev_cert", &data)?)
}

/// Creates the self-signed `.pfx`/`.cer` pair when `program` asks for one.
///
/// The script holds the password in plain text and is removed again even if
/// PowerShell fails.
pub async fn ensure_dev_cert<R: ToolRunner>(
    runner: &R,
    program: &ProgramOptions,
    logger: &PackagingLogger,
) -> Result<()> {
    if !program.create_dev_cert {
        return Ok(());
    }

    let script = render_dev_cert_script(program)?;
    let script_path = program.output_dir.join(DEV_CERT_SCRIPT);
    write_file(&script_path, script).await?;

    let result = powershell(runner, &path_arg(&script_path), logger).await;
    tokio::fs::remove_file(&script_path)
        .await
        .fs_context("removing dev cert script", &script_path)?;
    result.map(|_| ())
}

fn optional_path(path: Option<&Path>) -> String {
    path.map(path_arg).unwrap_or_default()
}

/// Escapes a value for a single-quoted PowerShell string.
fn quote(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msix::testing::{RecordingRunner, program};

    #[test]
    fn test_script_contains_subject_password_and_paths() {
        let dir = tempfile::tempdir().unwrap();
        let program = program(dir.path());

        let script = render_dev_cert_script(&program).unwrap();
        assert!(script.contains("$subjectName = 'CN=Electron'"));
        assert!(!script.contains("CN=CN="));
        assert!(script.contains("$pfxPasswordPlain = 's3cret'"));
        assert!(script.contains(&format!(
            "$pfxOutputPath = '{}'",
            dir.path().join("dev_cert.pfx").display()
        )));
        assert!(script.contains(&format!(
            "$cerOutputPath = '{}'",
            dir.path().join("dev_cert.cer").display()
        )));
    }

    #[test]
    fn test_script_quotes_single_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let mut program = program(dir.path());
        program.publisher = "CN=O'Brien & Sons".to_string();

        let script = render_dev_cert_script(&program).unwrap();
        assert!(script.contains("$subjectName = 'CN=O''Brien & Sons'"));
    }

    #[tokio::test]
    async fn test_powershell_command_and_script_args() {
        let runner = RecordingRunner::default().respond("7.4.0");
        let logger = PackagingLogger::default();

        let out = powershell(&runner, "$PSVersionTable.PSVersion", &logger)
            .await
            .unwrap();
        powershell(&runner, "C:\\out\\create_dev_cert.ps1", &logger)
            .await
            .unwrap();

        assert_eq!(out, "7.4.0");
        let calls = runner.calls();
        assert_eq!(
            calls[0].1,
            ["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command", "$PSVersionTable.PSVersion"]
        );
        assert_eq!(
            calls[1].1,
            ["-NoProfile", "-ExecutionPolicy", "Bypass", "C:\\out\\create_dev_cert.ps1"]
        );
    }

    #[tokio::test]
    async fn test_dev_cert_script_removed_after_run() {
        let dir = tempfile::tempdir().unwrap();
        let program = program(dir.path());
        let runner = RecordingRunner::default();

        ensure_dev_cert(&runner, &program, &PackagingLogger::default())
            .await
            .unwrap();

        let script = dir.path().join(DEV_CERT_SCRIPT);
        assert_eq!(runner.calls()[0].1.last(), Some(&path_arg(&script)));
        assert!(!script.exists());
    }

    #[tokio::test]
    async fn test_dev_cert_script_removed_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let program = program(dir.path());
        let runner = RecordingRunner::default().fail("pwsh.exe", 1);

        let result = ensure_dev_cert(&runner, &program, &PackagingLogger::default()).await;

        assert!(result.is_err());
        assert!(!dir.path().join(DEV_CERT_SCRIPT).exists());
    }

    #[tokio::test]
    async fn test_no_dev_cert_requested() {
        let dir = tempfile::tempdir().unwrap();
        let mut program = program(dir.path());
        program.create_dev_cert = false;
        let runner = RecordingRunner::default();

        ensure_dev_cert(&runner, &program, &PackagingLogger::default())
            .await
            .unwrap();
        assert!(runner.calls().is_empty());
    }
}
