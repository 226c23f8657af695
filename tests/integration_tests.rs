//! Integration tests for pipguard
//!
//! These tests verify:
//! - PyPI adapter, checker and selector working together over HTTP
//! - Inventory parsing feeding the checker
//! - Version range matching properties

use mockito::{Server, ServerGuard};
use pipguard::checker::{CompatibilityCheck, CompatibilityChecker};
use pipguard::domain::{Conflict, Inventory};
use pipguard::package_manager::parse_listing;
use pipguard::registry::{HttpClient, PackageIndex, PyPIAdapter};
use pipguard::selector::find_best_compatible_version;
use pipguard::version::is_compatible;
use std::sync::Arc;

fn adapter(server: &ServerGuard) -> Arc<PyPIAdapter> {
    let client = HttpClient::new().unwrap().with_max_retries(0);
    Arc::new(PyPIAdapter::with_base_url(client, server.url()))
}

fn inventory(json: &str) -> Inventory {
    Inventory::new(parse_listing(json).unwrap())
}

async fn mock_release(
    server: &mut ServerGuard,
    name: &str,
    version: &str,
    requires_dist: serde_json::Value,
) -> mockito::Mock {
    let body = serde_json::json!({
        "info": { "name": name, "version": version, "requires_dist": requires_dist }
    });
    server
        .mock("GET", format!("/pypi/{}/{}/json", name, version).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(1)
        .create_async()
        .await
}

async fn mock_project(server: &mut ServerGuard, name: &str, versions: &[&str]) -> mockito::Mock {
    let releases: serde_json::Map<String, serde_json::Value> = versions
        .iter()
        .map(|v| (v.to_string(), serde_json::json!([])))
        .collect();
    server
        .mock("GET", format!("/pypi/{}/json", name).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::json!({ "releases": releases }).to_string())
        .create_async()
        .await
}

mod checking {
    use super::*;

    #[tokio::test]
    async fn test_null_requires_dist_is_compatible_with_anything() {
        let mut server = Server::new_async().await;
        let _m = mock_release(&mut server, "six", "1.16.0", serde_json::Value::Null).await;
        let checker = CompatibilityChecker::new(adapter(&server));

        let installed = inventory(r#"[{"name": "numpy", "version": "0.1"}]"#);
        let report = checker.check("six", "1.16.0", &installed).await.unwrap();
        assert!(report.is_compatible());

        let report = checker
            .check("six", "1.16.0", &Inventory::default())
            .await
            .unwrap();
        assert!(report.is_compatible());
    }

    #[tokio::test]
    async fn test_conflicts_are_collected() {
        let mut server = Server::new_async().await;
        let _m = mock_release(
            &mut server,
            "pandas",
            "2.2.0",
            serde_json::json!([
                "numpy>=1.22.4; python_version < \"3.11\"",
                "python-dateutil>=2.8.2",
                "pytz>=2020.1",
                "tzdata>=2022.7",
                "pytest>=7.3.2; extra == \"test\""
            ]),
        )
        .await;
        let checker = CompatibilityChecker::new(adapter(&server));
        let installed = inventory(
            r#"[
                {"name": "numpy", "version": "1.21.0"},
                {"name": "python_dateutil", "version": "2.9.0"},
                {"name": "pytz", "version": "2019.3"},
                {"name": "pytest", "version": "6.0.0"}
            ]"#,
        );

        let report = checker.check("pandas", "2.2.0", &installed).await.unwrap();

        assert_eq!(
            report.conflicts,
            vec![
                Conflict::new("numpy", "1.21.0", ">=1.22.4"),
                Conflict::new("pytz", "2019.3", ">=2020.1"),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_release_is_distinct_from_conflict() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/pypi/pandas/0.0.0/json")
            .with_status(404)
            .create_async()
            .await;
        let checker = CompatibilityChecker::new(adapter(&server));

        let err = checker
            .check("pandas", "0.0.0", &Inventory::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}

mod selecting {
    use super::*;

    #[tokio::test]
    async fn test_picks_newest_compatible_and_stops() {
        let mut server = Server::new_async().await;
        let _p = mock_project(&mut server, "pkg", &["1.0", "3.0", "not a version", "2.0"]).await;
        let newest = mock_release(&mut server, "pkg", "3.0", serde_json::json!(["dep>=3"])).await;
        let middle = mock_release(&mut server, "pkg", "2.0", serde_json::json!(["dep>=2"])).await;
        let oldest = server
            .mock("GET", "/pypi/pkg/1.0/json")
            .expect(0)
            .create_async()
            .await;

        let index = adapter(&server);
        let checker = CompatibilityChecker::new(index.clone());
        let installed = inventory(r#"[{"name": "dep", "version": "2.5"}]"#);

        let selection = find_best_compatible_version(index.as_ref(), &checker, "pkg", &installed)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(selection.version, "2.0");
        assert_eq!(selection.examined, 2);
        newest.assert_async().await;
        middle.assert_async().await;
        oldest.assert_async().await;
    }

    #[tokio::test]
    async fn test_versions_are_sorted_by_pep440() {
        let mut server = Server::new_async().await;
        let _p = mock_project(
            &mut server,
            "pkg",
            &["1.10.0", "1.9.0", "1.10.0rc1", "2.0.0.dev1", "1.2.post1", "1.2"],
        )
        .await;

        let versions = adapter(&server).fetch_versions("pkg").await.unwrap();
        assert_eq!(
            versions,
            vec!["2.0.0.dev1", "1.10.0", "1.10.0rc1", "1.9.0", "1.2.post1", "1.2"]
        );
    }

    #[tokio::test]
    async fn test_empty_release_list_yields_none_without_checking() {
        let mut server = Server::new_async().await;
        let _p = mock_project(&mut server, "ghost", &[]).await;
        let any_release = server
            .mock("GET", mockito::Matcher::Regex(r"^/pypi/ghost/.+/json$".to_string()))
            .expect(0)
            .create_async()
            .await;

        let index = adapter(&server);
        let checker = CompatibilityChecker::new(index.clone());
        let selection =
            find_best_compatible_version(index.as_ref(), &checker, "ghost", &Inventory::default())
                .await
                .unwrap();

        assert!(selection.is_none());
        any_release.assert_async().await;
    }

    #[tokio::test]
    async fn test_index_error_on_newest_ends_search() {
        let mut server = Server::new_async().await;
        let _p = mock_project(&mut server, "pkg", &["2.0", "1.0"]).await;
        let _broken = server
            .mock("GET", "/pypi/pkg/2.0/json")
            .with_status(500)
            .create_async()
            .await;
        let older = server
            .mock("GET", "/pypi/pkg/1.0/json")
            .expect(0)
            .create_async()
            .await;

        let index = adapter(&server);
        let checker = CompatibilityChecker::new(index.clone());
        let err = find_best_compatible_version(index.as_ref(), &checker, "pkg", &Inventory::default())
            .await
            .unwrap_err();

        assert!(!err.is_not_found());
        older.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_version_fits() {
        let mut server = Server::new_async().await;
        let _p = mock_project(&mut server, "pkg", &["2.0", "1.0"]).await;
        let _a = mock_release(&mut server, "pkg", "2.0", serde_json::json!(["dep>=9"])).await;
        let _b = mock_release(&mut server, "pkg", "1.0", serde_json::json!(["dep>=8"])).await;

        let index = adapter(&server);
        let checker = CompatibilityChecker::new(index.clone());
        let installed = inventory(r#"[{"name": "dep", "version": "1.0"}]"#);

        let selection = find_best_compatible_version(index.as_ref(), &checker, "pkg", &installed)
            .await
            .unwrap();
        assert!(selection.is_none());
    }
}

mod matching {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(is_compatible("1.2.3", "==1.2.3").unwrap());
        assert!(!is_compatible("1.2.4", "==1.2.3").unwrap());
    }

    #[test]
    fn test_empty_range_accepts_everything() {
        assert!(is_compatible("0.0.1", "").unwrap());
        assert!(is_compatible("99.0", "   ").unwrap());
    }

    #[test]
    fn test_bounded_range() {
        assert!(is_compatible("1.5.0", ">=1.0,<2.0").unwrap());
        assert!(!is_compatible("2.0.0", ">=1.0,<2.0").unwrap());
        assert!(!is_compatible("0.9", ">=1.0,<2.0").unwrap());
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        assert!(is_compatible("1.10.0", ">=1.9").unwrap());
        assert!(!is_compatible("1.9.0", ">=1.10").unwrap());
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(is_compatible("1.0", "__import__('os')").is_err());
        assert!(is_compatible("not-a-version", ">=1.0").is_err());
    }
}
