//! Integration tests for docsrv

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// docsrv with its config redirected into `temp`
    fn docsrv(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("docsrv");
        cmd.env("DOCSRV_CONFIG", temp.path().join("config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        docsrv(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("documentation"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        docsrv(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("docsrv"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        docsrv(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        docsrv(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[source]"))
            .stdout(predicate::str::contains("[build]"));
    }

    #[test]
    fn config_set_persists() {
        let temp = TempDir::new().unwrap();
        docsrv(&temp)
            .args(["config", "set", "source.owner", "acme"])
            .assert()
            .success();

        docsrv(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("owner = \"acme\""));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let temp = TempDir::new().unwrap();
        docsrv(&temp)
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn config_init_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        docsrv(&temp).args(["config", "init"]).assert().success();
        assert!(temp.path().join("config.toml").is_file());

        docsrv(&temp)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[source\nowner = ").unwrap();

        docsrv(&temp)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    /// Point the docs and work dirs into `temp` so builds never touch the
    /// user's state dir
    fn write_build_dirs(temp: &TempDir) {
        let config = format!(
            "[build]\ndocs_root = {:?}\nwork_dir = {:?}\n",
            temp.path().join("docs").display().to_string(),
            temp.path().join("work").display().to_string(),
        );
        std::fs::write(temp.path().join("config.toml"), config).unwrap();
    }

    #[test]
    fn resolve_defaults_to_latest_and_fails_cleanly() {
        let temp = TempDir::new().unwrap();
        write_build_dirs(&temp);

        docsrv(&temp)
            .args(["resolve", "widgets"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("source.owner is not configured"))
            .stderr(predicate::str::contains("panicked").not());
        assert!(temp.path().join("docs").is_dir());
    }

    #[test]
    fn resolve_accepts_explicit_version() {
        let temp = TempDir::new().unwrap();
        write_build_dirs(&temp);

        docsrv(&temp)
            .args(["resolve", "widgets", "v1.2.0", "--format", "json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("panicked").not());
    }

    #[test]
    fn resolve_help_lists_version_argument() {
        let temp = TempDir::new().unwrap();
        docsrv(&temp)
            .args(["resolve", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[VERSION]"));
    }

    #[test]
    fn releases_without_owner_fails() {
        let temp = TempDir::new().unwrap();
        docsrv(&temp)
            .args(["releases", "widgets"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("source.owner is not configured"));
    }
}

mod resolver_tests {
    use docsrv::build::MakePipeline;
    use docsrv::config::schema::BuildConfig;
    use docsrv::release::MemorySource;
    use docsrv::store::FsArtifactStore;
    use docsrv::{DocError, DocResolver, ResolverSettings, LATEST};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    const MAKEFILE: &str = "build:\n\techo $(BASE_URL) > $(DESTINATION_FOLDER)/index.html\n";

    fn write_tarball(path: &Path, entries: &[(&str, &str)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    struct Fixture {
        temp: TempDir,
        source: Arc<MemorySource>,
        resolver: DocResolver,
    }

    impl Fixture {
        /// Resolver over local tarballs, building with `script` under `sh -c`
        fn new(script: &str) -> Self {
            let temp = TempDir::new().unwrap();
            let source = Arc::new(MemorySource::new());

            let build = BuildConfig {
                docs_root: temp.path().join("docs"),
                work_dir: temp.path().join("work"),
                ..BuildConfig::default()
            };
            let pipeline = MakePipeline::new(&build).with_command(vec![
                "sh".to_string(),
                "-c".to_string(),
                script.to_string(),
            ]);

            let settings = ResolverSettings {
                base_url: "https://docs.example.org".to_string(),
                shared_folder: PathBuf::from("/etc/shared"),
                build_timeout: Duration::from_secs(60),
                catalog_ttl: Duration::from_secs(300),
                latest_ttl: Duration::from_secs(300),
                fetch_timeout: Duration::from_secs(5),
            };

            let resolver = DocResolver::new(
                source.clone(),
                Arc::new(FsArtifactStore::new(temp.path().join("docs"))),
                Arc::new(pipeline),
                settings,
            );

            Self {
                temp,
                source,
                resolver,
            }
        }

        /// Publish a release whose archive holds a Makefile
        fn release(&self, project: &str, tag: &str) {
            let tarball = self.temp.path().join(format!("{}-{}.tar.gz", project, tag));
            write_tarball(
                &tarball,
                &[(&format!("{}-{}/Makefile", project, tag), MAKEFILE)],
            );
            self.source
                .add(project, tag, &format!("file://{}", tarball.display()));
        }
    }

    #[tokio::test]
    async fn latest_builds_and_serves_newest_release() {
        let fixture = Fixture::new(
            "echo \"$BASE_URL\" > \"$DESTINATION_FOLDER/index.html\"; \
             echo \"$SHARED_REPO_FOLDER\" >> \"$DESTINATION_FOLDER/index.html\"",
        );
        fixture.release("widgets", "v1.2.0");
        fixture.release("widgets", "v1.10.0");
        fixture.release("widgets", "nightly");

        let artifact = fixture.resolver.resolve("widgets", LATEST).await.unwrap();

        assert_eq!(artifact.version, "v1.10.0");
        assert!(artifact.built);
        assert_eq!(
            artifact.location,
            fixture.temp.path().join("docs/widgets/v1.10.0")
        );
        assert_eq!(
            std::fs::read_to_string(artifact.location.join("index.html")).unwrap(),
            "https://docs.example.org/widgets/v1.10.0/\n/etc/shared\n"
        );
        assert_eq!(
            fixture.resolver.canonical_url("widgets", &artifact.version),
            "https://docs.example.org/widgets/v1.10.0/"
        );

        // Second request is served from the docs root
        let again = fixture.resolver.resolve("widgets", "v1.10.0").await.unwrap();
        assert!(!again.built);
        assert_eq!(again.location, artifact.location);
    }

    #[tokio::test]
    async fn versions_resolve_semantically() {
        let fixture = Fixture::new("touch \"$DESTINATION_FOLDER/index.html\"");
        fixture.release("widgets", "v2.0.0");

        let artifact = fixture.resolver.resolve("widgets", "2.0.0").await.unwrap();
        assert_eq!(artifact.version, "v2.0.0");
        assert!(artifact.location.join("index.html").is_file());
    }

    #[tokio::test]
    async fn failed_build_leaves_nothing_behind() {
        let fixture = Fixture::new("touch \"$DESTINATION_FOLDER/half.html\"; exit 2");
        fixture.release("widgets", "1.0.0");

        let err = fixture.resolver.resolve("widgets", "1.0.0").await.unwrap_err();

        assert!(matches!(err, DocError::BuildFailed { .. }));
        assert_eq!(err.status_code(), 500);
        assert!(!fixture.temp.path().join("docs/widgets/1.0.0").exists());
        assert_eq!(fixture.resolver.gate().in_flight(), 0);
    }

    #[tokio::test]
    async fn unknown_requests_are_not_found() {
        let fixture = Fixture::new("true");
        fixture.release("widgets", "1.0.0");

        let err = fixture.resolver.resolve("widgets", "3.0.0").await.unwrap_err();
        assert_eq!(err.status_code(), 404);

        let err = fixture.resolver.resolve("gadgets", LATEST).await.unwrap_err();
        assert!(matches!(err, DocError::UnknownProject(_)));
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn listing_is_ascending_and_cached() {
        let fixture = Fixture::new("true");
        fixture.release("widgets", "2.0.0");
        fixture.release("widgets", "1.0.0");

        let versions = fixture.resolver.list_versions("widgets", false).await.unwrap();
        assert_eq!(versions, vec!["1.0.0", "2.0.0"]);

        fixture.source.set_unavailable(true);
        let cached = fixture.resolver.list_versions("widgets", true).await.unwrap();
        assert_eq!(cached, versions);
    }
}
