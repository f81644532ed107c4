//! Contract tests run against every adapter built by the factory.

use marketlens_core::adapter::{create_adapter, default_adapters, DataSourceAdapter};
use marketlens_core::error::{ErrorKind, TransportError};
use marketlens_core::test_helpers::StubTransport;
use marketlens_core::transport::HttpTransport;
use marketlens_core::{DataSource, DataSourceConfig, FetchOptions};
use serde_json::json;
use std::sync::Arc;

fn census_body() -> serde_json::Value {
    json!([
        ["NAME", "B25064_001E", "B25077_001E", "B25003_001E", "B25003_002E", "B25003_003E"],
        ["ZCTA5 02139", "2400", "850000", "1000", "400", "550"]
    ])
}

fn adapters_with(transport: Arc<StubTransport>, enabled: bool) -> Vec<Box<dyn DataSourceAdapter>> {
    let transport: Arc<dyn HttpTransport> = transport;
    default_adapters(transport, |source| {
        DataSourceConfig::defaults_for(source)
            .with_enabled(enabled)
            .with_retry_attempts(0)
    })
}

#[test]
fn every_adapter_yields_complete_tagged_records() {
    let transport = Arc::new(StubTransport::new().route("acs5", Ok(census_body())));
    for adapter in adapters_with(transport, true) {
        let record = adapter.fetch_data("02139", &FetchOptions::default()).unwrap();
        assert!(record.is_complete(), "{} output incomplete", adapter.source());
        assert_eq!(record.data_source, adapter.source());
        assert_eq!(record.zip_code, "02139");
    }
}

#[test]
fn disabled_adapters_perform_no_io() {
    let transport = Arc::new(StubTransport::new().route("", Ok(census_body())));
    for adapter in adapters_with(transport.clone(), false) {
        let err = adapter.fetch_data("02139", &FetchOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Disabled);
        assert!(!err.is_retryable());
        assert!(!adapter.is_available());
    }
    assert_eq!(transport.calls(), 0);
}

#[test]
fn invalid_zip_is_rejected_everywhere() {
    let transport = Arc::new(StubTransport::new());
    for adapter in adapters_with(transport.clone(), true) {
        for zip in ["", "1234", "123456", "12a45"] {
            let err = adapter.fetch_data(zip, &FetchOptions::default()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }
    assert_eq!(transport.calls(), 0);
}

#[test]
fn census_failures_surface_instead_of_mock() {
    let transport: Arc<dyn HttpTransport> =
        Arc::new(StubTransport::failing(TransportError::Connect("refused".into())));
    let census = create_adapter(
        DataSource::Census,
        DataSourceConfig::defaults_for(DataSource::Census).with_retry_attempts(0),
        transport,
    )
    .unwrap();
    let err = census.fetch_data("02139", &FetchOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.provider(), Some(DataSource::Census));
}

#[test]
fn probes_never_panic_when_everything_is_down() {
    let transport = Arc::new(
        StubTransport::failing(TransportError::Timeout { timeout_ms: 5_000 })
            .with_head(Err(TransportError::Timeout { timeout_ms: 5_000 })),
    );
    let availability: Vec<(DataSource, bool)> = adapters_with(transport, true)
        .iter()
        .map(|a| (a.source(), a.is_available()))
        .collect();
    assert_eq!(
        availability,
        vec![
            (DataSource::Census, false),
            (DataSource::CountyAssessor, false),
            (DataSource::Zillow, true),
            (DataSource::Realtor, true),
            (DataSource::Mls, true),
        ]
    );
}

#[test]
fn metadata_mirrors_enabled_flag() {
    let transport = Arc::new(StubTransport::new());
    for adapter in adapters_with(transport, false) {
        let meta = adapter.metadata();
        assert_eq!(meta.source, adapter.source());
        assert!(!meta.is_available);
        assert!(!meta.name.is_empty());
    }
}
