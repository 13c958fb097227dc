use bundle_deploy::manifest::{
    ArchiveDeclaration, DeploymentManifestBuilder, DestinationComplianceMode, FileDeclaration,
    FileSource, Handover, ManifestError, SystemServiceDeclaration,
};
use bundle_deploy::pattern::FileSetSpec;
use bundle_deploy::platform::{DebianPlatform, RedHatPlatform};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

fn redhat_builder(unit: &str) -> DeploymentManifestBuilder {
    DeploymentManifestBuilder::with_platform(unit, Arc::new(RedHatPlatform))
}

#[test]
fn test_exploded_archive_with_replace_pattern() {
    let mut builder = redhat_builder("web");
    builder
        .add_archive(
            ArchiveDeclaration::local("/bundle/app.war")
                .named("app.war")
                .exploded(true)
                .replace(FileSetSpec::new().include("**/*.xml")),
        )
        .unwrap();
    let manifest = builder.build().unwrap();

    let archive = Path::new("/bundle/app.war");
    assert!(manifest.is_exploded(archive));
    assert_eq!(manifest.archives().get(archive), Some(&None));

    let pattern = manifest.archive_replace_patterns().get(archive).unwrap();
    assert!(pattern.is_match("app/web.xml"));
    assert!(pattern.is_match("web.xml"));
    assert!(!pattern.is_match("app/index.html"));
}

#[test]
fn test_archive_defaults_to_compressed_without_replace_pattern() {
    let mut builder = redhat_builder("web");
    builder
        .add_archive(ArchiveDeclaration::local("/bundle/lib.jar").into_dir("lib"))
        .unwrap();
    let manifest = builder.build().unwrap();

    let archive = Path::new("/bundle/lib.jar");
    assert!(!manifest.is_exploded(archive));
    assert_eq!(manifest.archives_exploded().get(archive), Some(&false));
    assert!(manifest.archive_replace_patterns().is_empty());
    assert_eq!(
        manifest.archives().get(archive),
        Some(&Some(PathBuf::from("lib")))
    );
}

#[test]
fn test_system_service_with_script_only() {
    let mut builder = redhat_builder("svc");
    builder
        .add_file(FileDeclaration::local("/bundle/README").to_file("README"))
        .unwrap();
    builder
        .add_system_service(SystemServiceDeclaration::new("myapp", "/bundle/bin/myapp"))
        .unwrap();
    let manifest = builder.build().unwrap();

    assert_eq!(manifest.files().len(), 2);
    assert_eq!(
        manifest.files().get(Path::new("/bundle/bin/myapp")),
        Some(&PathBuf::from("/etc/init.d/myapp"))
    );
    assert!(manifest.raw_files_to_replace().is_empty());
}

#[test]
fn test_system_service_config_file_is_replaced() {
    let mut builder =
        DeploymentManifestBuilder::with_platform("svc", Arc::new(DebianPlatform));
    builder
        .add_system_service(
            SystemServiceDeclaration::new("myapp", "/bundle/bin/myapp")
                .with_config_file("/bundle/conf/myapp.conf"),
        )
        .unwrap();
    let manifest = builder.build().unwrap();

    assert_eq!(
        manifest.files().get(Path::new("/bundle/conf/myapp.conf")),
        Some(&PathBuf::from("/etc/default/myapp"))
    );
    assert!(manifest
        .raw_files_to_replace()
        .contains(Path::new("/bundle/conf/myapp.conf")));
    assert!(!manifest
        .raw_files_to_replace()
        .contains(Path::new("/bundle/bin/myapp")));
}

#[test]
fn test_second_system_service_fails_before_registration() {
    let mut builder = redhat_builder("svc");
    builder
        .add_system_service(SystemServiceDeclaration::new("first", "/bundle/bin/first"))
        .unwrap();

    let result = builder.add_system_service(
        SystemServiceDeclaration::new("second", "/bundle/bin/second")
            .with_config_file("/bundle/conf/second.conf"),
    );
    assert!(matches!(
        result,
        Err(ManifestError::DuplicateElement {
            element: "system-service",
            ..
        })
    ));

    assert_eq!(builder.system_service().unwrap().name, "first");
    let manifest = builder.build().unwrap();
    assert_eq!(manifest.files().len(), 1);
    assert!(manifest.files().get(Path::new("/bundle/bin/second")).is_none());
    assert!(manifest.raw_files_to_replace().is_empty());
}

#[test]
fn test_absolute_ignore_dir_is_rejected() {
    let mut builder = redhat_builder("app");
    let result = builder.add_ignore(&[
        FileSetSpec::under("logs"),
        FileSetSpec::under("/var/tmp").include("*.tmp"),
    ]);

    match result {
        Err(ManifestError::AbsoluteIgnoreDir { dir }) => assert_eq!(dir, "/var/tmp"),
        other => panic!("expected absolute ignore dir error, got {other:?}"),
    }
}

#[test]
fn test_ignore_pattern_is_compiled() {
    let mut builder = redhat_builder("app");
    builder
        .add_file(FileDeclaration::local("/bundle/app.jar"))
        .unwrap();
    builder
        .add_ignore(&[
            FileSetSpec::under("logs"),
            FileSetSpec::under("data").include("*.db"),
        ])
        .unwrap();
    let manifest = builder.build().unwrap();

    assert!(manifest.is_ignored("logs/server.log"));
    assert!(manifest.is_ignored("data/cache.db"));
    assert!(!manifest.is_ignored("data/nested/cache.db"));
    assert!(!manifest.is_ignored("app.jar"));
}

#[test]
fn test_empty_manifest_fails_validation() {
    let mut builder = redhat_builder("empty");
    builder.add_ignore(&[FileSetSpec::under("logs")]).unwrap();

    match builder.build() {
        Err(ManifestError::EmptyManifest { unit }) => assert_eq!(unit, "empty"),
        other => panic!("expected empty manifest error, got {other:?}"),
    }
}

#[test]
fn test_url_content_counts_as_deployable() {
    let mut builder = redhat_builder("remote");
    builder
        .add_archive(ArchiveDeclaration::url(
            Url::parse("https://repo.example.com/dist/app-2.0.zip").unwrap(),
        ))
        .unwrap();

    let manifest = builder.build().unwrap();
    assert!(manifest.has_url_content());
    assert_eq!(manifest.url_archives().len(), 1);
}

#[test]
fn test_files_keep_declaration_order() {
    let mut builder = redhat_builder("ordered");
    for name in ["c.txt", "a.txt", "b.txt"] {
        builder
            .add_file(FileDeclaration::local(format!("/bundle/{name}")).into_dir("out"))
            .unwrap();
    }
    let manifest = builder.build().unwrap();

    let sources: Vec<_> = manifest.files().keys().cloned().collect();
    assert_eq!(
        sources,
        vec![
            PathBuf::from("/bundle/c.txt"),
            PathBuf::from("/bundle/a.txt"),
            PathBuf::from("/bundle/b.txt"),
        ]
    );
}

#[test]
fn test_url_file_destination_uses_url_base_name() {
    let mut builder = redhat_builder("remote");
    builder
        .add_file(
            FileDeclaration::url(Url::parse("http://example.com/files/tool.sh").unwrap())
                .into_dir("bin")
                .with_replace(true),
        )
        .unwrap();
    let manifest = builder.build().unwrap();

    let url = Url::parse("http://example.com/files/tool.sh").unwrap();
    assert_eq!(manifest.url_files().get(&url), Some(&PathBuf::from("bin/tool.sh")));
    assert!(manifest.raw_url_files_to_replace().contains(&url));
}

#[test]
fn test_localize_urls_moves_remote_entries_into_base_dir() {
    let file_url = Url::parse("http://example.com/files/tool.sh").unwrap();
    let archive_url = Url::parse("http://example.com/dist/app.zip").unwrap();

    let mut builder = redhat_builder("remote");
    builder
        .add_file(FileDeclaration::url(file_url.clone()).to_file("/opt/tool.sh").with_replace(true))
        .unwrap();
    builder
        .add_archive(
            ArchiveDeclaration::url(archive_url.clone())
                .exploded(true)
                .replace(FileSetSpec::new().include("*.properties")),
        )
        .unwrap();
    let manifest = builder.build().unwrap();

    let (localized, downloads) = manifest.localize_urls(Path::new("/tmp/base"));

    assert!(!localized.has_url_content());
    assert_eq!(downloads.len(), 2);
    assert_eq!(downloads[0].url, file_url);
    assert_eq!(downloads[0].path, PathBuf::from("/tmp/base/opt/tool.sh"));
    assert_eq!(downloads[1].path, PathBuf::from("/tmp/base/app.zip"));

    let local_file = Path::new("/tmp/base/opt/tool.sh");
    assert_eq!(localized.files().get(local_file), Some(&PathBuf::from("/opt/tool.sh")));
    assert!(localized.raw_files_to_replace().contains(local_file));

    let local_archive = Path::new("/tmp/base/app.zip");
    assert!(localized.is_exploded(local_archive));
    assert!(localized
        .archive_replace_patterns()
        .get(local_archive)
        .unwrap()
        .is_match("app.properties"));
}

#[test]
fn test_compliance_defaults_and_override() {
    let mut builder = redhat_builder("app");
    builder.add_file(FileDeclaration::local("/bundle/a")).unwrap();
    assert_eq!(
        builder.build().unwrap().compliance(),
        DestinationComplianceMode::FilesAndDirectories
    );

    let mut builder = redhat_builder("app").compliance(DestinationComplianceMode::Full);
    builder.add_file(FileDeclaration::local("/bundle/a")).unwrap();
    assert_eq!(
        builder.build().unwrap().compliance(),
        DestinationComplianceMode::Full
    );
}

#[test]
fn test_manifest_serializes_to_json() {
    let mut builder = redhat_builder("app");
    builder
        .add_file(FileDeclaration::local("/bundle/a.conf").to_file("conf/a.conf"))
        .unwrap();
    builder.add_ignore(&[FileSetSpec::under("logs")]).unwrap();
    let manifest = builder.build().unwrap();

    let json = serde_json::to_value(&manifest).unwrap();
    assert_eq!(json["unitName"], "app");
    assert_eq!(json["compliance"], "filesAndDirectories");
    assert_eq!(json["files"]["/bundle/a.conf"], "conf/a.conf");
    assert_eq!(json["ignorePattern"], "(logs/.*)");
}

#[test]
fn test_handover_only_unit_has_something_to_do() {
    let url = Url::parse("https://repo.example.com/dist/app.war").unwrap();
    let mut builder = redhat_builder("handover");
    builder
        .add_archive(
            ArchiveDeclaration::url(url.clone())
                .exploded(true)
                .handover(Handover::new("deployment")),
        )
        .unwrap();
    let manifest = builder.build().unwrap();

    assert!(manifest.url_archives().is_empty());
    assert!(manifest.url_archives_exploded().is_empty());
    assert!(manifest.has_url_content());

    let (localized, downloads) = manifest.localize_urls(Path::new("/tmp/base"));
    let expected = PathBuf::from("/tmp/base/.handover-download/app.war");
    assert_eq!(downloads.len(), 1);
    assert_eq!(downloads[0].url, url);
    assert_eq!(downloads[0].path, expected);
    assert!(!localized.has_url_content());
    assert_eq!(
        localized.contents_to_handover()[0].source,
        FileSource::Local(expected)
    );
}
