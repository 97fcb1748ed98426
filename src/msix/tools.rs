//! Argument vectors for the Windows SDK tools.

use super::runner::ToolRunner;
use crate::error::Result;
use crate::logger::PackagingLogger;
use crate::program::ProgramOptions;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static SUBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Subject:\s*(.*)").expect("certificate subject regex is valid"));

pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Reads the subject of a `.pfx` certificate with `certutil -dump`.
///
/// Returns `None` (and logs an error) when the dump has no `Subject:` line.
pub async fn cert_publisher<R: ToolRunner>(
    runner: &R,
    cert: &Path,
    password: &str,
    logger: &PackagingLogger,
) -> Result<Option<String>> {
    let args = vec![
        "-p".to_string(),
        password.to_string(),
        "-dump".to_string(),
        path_arg(cert),
    ];
    let stdout = runner.run(Path::new("certutil"), &args).await?.join("\n");

    match SUBJECT_RE.captures(&stdout) {
        Some(caps) => Ok(Some(caps[1].trim().to_string())),
        None => {
            logger.error("Unable to find publisher in Cert");
            Ok(None)
        }
    }
}

/// Creates the PRI configuration with `makepri createconfig`.
pub async fn pri_config<R: ToolRunner>(
    runner: &R,
    program: &ProgramOptions,
    logger: &PackagingLogger,
) -> Result<()> {
    if !program.create_pri {
        logger.debug("Skipping making pri config.");
        return Ok(());
    }
    logger.debug("Creating pri config.");
    let args = vec![
        "createconfig".to_string(),
        "/cf".to_string(),
        path_arg(&program.pri_config),
        "/dq".to_string(),
        "en-US".to_string(),
    ];
    runner.run(&program.make_pri, &args).await?;
    Ok(())
}

/// Indexes the layout into `resources.pri` with `makepri new`.
pub async fn pri<R: ToolRunner>(
    runner: &R,
    program: &ProgramOptions,
    logger: &PackagingLogger,
) -> Result<()> {
    if !program.create_pri {
        logger.debug("Skipping making pri.");
        return Ok(());
    }
    logger.debug("Making pri.");
    let args = vec![
        "new".to_string(),
        "/pr".to_string(),
        path_arg(&program.layout_dir),
        "/cf".to_string(),
        path_arg(&program.pri_config),
        "/mn".to_string(),
        path_arg(&program.app_manifest_layout),
        "/of".to_string(),
        path_arg(&program.pri_file),
        "/v".to_string(),
    ];
    runner.run(&program.make_pri, &args).await?;
    Ok(())
}

/// Packs the layout into the `.msix` with `makeappx pack`.
///
/// Sparse packages are packed with `/nv`, which skips semantic validation of
/// files the manifest references but the layout does not contain.
pub async fn make<R: ToolRunner>(runner: &R, program: &ProgramOptions) -> Result<()> {
    let mut args = vec![
        "pack".to_string(),
        "/d".to_string(),
        path_arg(&program.layout_dir),
        "/p".to_string(),
        path_arg(&program.msix),
        "/o".to_string(),
    ];
    if program.is_sparse_package {
        args.push("/nv".to_string());
    }
    runner.run(&program.make_msix, &args).await?;
    Ok(())
}

/// Signs the package with `signtool sign`.
pub async fn sign<R: ToolRunner>(
    runner: &R,
    program: &ProgramOptions,
    logger: &PackagingLogger,
) -> Result<()> {
    if !program.sign {
        logger.debug("Skipping signing.");
        return Ok(());
    }
    let mut args = Vec::with_capacity(program.sign_params.len() + 2);
    args.push("sign".to_string());
    args.extend(program.sign_params.iter().cloned());
    args.push(path_arg(&program.msix));
    runner.run(&program.sign_tool, &args).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msix::testing::{RecordingRunner, program};

    fn args(call: &(std::path::PathBuf, Vec<String>)) -> Vec<&str> {
        call.1.iter().map(String::as_str).collect()
    }

    #[tokio::test]
    async fn test_cert_publisher_reads_subject() {
        let runner = RecordingRunner::default().respond(
            "================ Certificate 0 ================\n\
             Serial Number: 1a2b\n\
             Subject: CN=Electron \n\
             Cert Hash(sha1): ff",
        );
        let publisher = cert_publisher(
            &runner,
            Path::new("C:\\certs\\dev.pfx"),
            "pass",
            &PackagingLogger::default(),
        )
        .await
        .unwrap();

        assert_eq!(publisher.as_deref(), Some("CN=Electron"));
        let calls = runner.calls();
        assert_eq!(calls[0].0, Path::new("certutil"));
        assert_eq!(args(&calls[0]), ["-p", "pass", "-dump", "C:\\certs\\dev.pfx"]);
    }

    #[tokio::test]
    async fn test_cert_publisher_without_subject() {
        let runner = RecordingRunner::default().respond("CertUtil: -dump command completed.");
        let publisher = cert_publisher(
            &runner,
            Path::new("dev.pfx"),
            "",
            &PackagingLogger::default(),
        )
        .await
        .unwrap();
        assert_eq!(publisher, None);
    }

    #[tokio::test]
    async fn test_pri_commands() {
        let dir = tempfile::tempdir().unwrap();
        let program = program(dir.path());
        let runner = RecordingRunner::default();
        let logger = PackagingLogger::default();

        pri_config(&runner, &program, &logger).await.unwrap();
        pri(&runner, &program, &logger).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, program.make_pri);
        assert_eq!(
            args(&calls[0]),
            ["createconfig", "/cf", path_arg(&program.pri_config).as_str(), "/dq", "en-US"]
        );
        assert_eq!(
            args(&calls[1]),
            [
                "new",
                "/pr",
                path_arg(&program.layout_dir).as_str(),
                "/cf",
                path_arg(&program.pri_config).as_str(),
                "/mn",
                path_arg(&program.app_manifest_layout).as_str(),
                "/of",
                path_arg(&program.pri_file).as_str(),
                "/v",
            ]
        );
    }

    #[tokio::test]
    async fn test_pri_skipped_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut program = program(dir.path());
        program.create_pri = false;
        let runner = RecordingRunner::default();
        let logger = PackagingLogger::default();

        pri_config(&runner, &program, &logger).await.unwrap();
        pri(&runner, &program, &logger).await.unwrap();
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_make_sparse_skips_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut program = program(dir.path());
        let runner = RecordingRunner::default();

        make(&runner, &program).await.unwrap();
        program.is_sparse_package = true;
        make(&runner, &program).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].0, program.make_msix);
        assert_eq!(
            args(&calls[0]),
            ["pack", "/d", path_arg(&program.layout_dir).as_str(), "/p", path_arg(&program.msix).as_str(), "/o"]
        );
        assert_eq!(args(&calls[1]).last(), Some(&"/nv"));
    }

    #[tokio::test]
    async fn test_sign_passes_params_then_package() {
        let dir = tempfile::tempdir().unwrap();
        let program = program(dir.path());
        let runner = RecordingRunner::default();

        sign(&runner, &program, &PackagingLogger::default()).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].0, program.sign_tool);
        let mut expected = vec!["sign".to_string()];
        expected.extend(program.sign_params.iter().cloned());
        expected.push(path_arg(&program.msix));
        assert_eq!(calls[0].1, expected);
    }

    #[tokio::test]
    async fn test_sign_skipped_and_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let mut program = program(dir.path());
        let logger = PackagingLogger::default();

        program.sign = false;
        let runner = RecordingRunner::default();
        sign(&runner, &program, &logger).await.unwrap();
        assert!(runner.calls().is_empty());

        program.sign = true;
        let runner = RecordingRunner::default().fail("SignTool.exe", 1);
        let err = sign(&runner, &program, &logger).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed running SignTool.exe Exit Code: 1 See previous errors for details"
        );
    }
}
