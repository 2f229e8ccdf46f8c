//! CORS configuration and preflight integration tests.

#[cfg(test)]
mod tests {
    use bucketgate_access::{
        AccessConfig, AccessError, CorsConfiguration, CorsRule, RequestContext,
    };

    use crate::{alice, bob, create_test_bucket, service, service_with};

    fn as_alice() -> RequestContext {
        RequestContext::user(alice())
    }

    fn rule(origins: &[&str], methods: &[&str], headers: &[&str]) -> CorsRule {
        CorsRule {
            id: None,
            allowed_origins: origins.iter().map(|s| (*s).to_owned()).collect(),
            allowed_methods: methods.iter().map(|s| (*s).to_owned()).collect(),
            allowed_headers: headers.iter().map(|s| (*s).to_owned()).collect(),
            expose_headers: vec!["ETag".to_owned()],
            max_age_seconds: Some(600),
        }
    }

    fn site_config() -> CorsConfiguration {
        CorsConfiguration::new(vec![
            rule(&["https://app.example.com"], &["GET", "PUT"], &["Content-*", "x-amz-*"]),
            rule(&["https://*.example.org"], &["GET"], &[]),
        ])
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_should_store_and_return_configuration() {
        let service = service();
        let bucket = create_test_bucket(&service, "cors-crud");

        assert!(matches!(
            service.get_bucket_cors(&as_alice(), &bucket),
            Err(AccessError::NoSuchCorsConfiguration)
        ));

        service
            .put_bucket_cors(&as_alice(), &bucket, site_config())
            .expect("put cors");
        assert_eq!(
            service
                .get_bucket_cors(&as_alice(), &bucket)
                .expect("get cors"),
            site_config()
        );
        assert!(matches!(
            service.put_bucket_cors(&RequestContext::user(bob()), &bucket, site_config()),
            Err(AccessError::AccessDenied)
        ));

        service
            .delete_bucket_cors(&as_alice(), &bucket)
            .expect("delete cors");
        assert!(matches!(
            service.get_bucket_cors(&as_alice(), &bucket),
            Err(AccessError::NoSuchCorsConfiguration)
        ));
    }

    #[test]
    fn test_should_reject_invalid_configurations() {
        let service = service();
        let bucket = create_test_bucket(&service, "cors-invalid");

        assert!(matches!(
            service.put_bucket_cors(&as_alice(), &bucket, CorsConfiguration::default()),
            Err(AccessError::MalformedXml { .. })
        ));
        assert!(matches!(
            service.put_bucket_cors(
                &as_alice(),
                &bucket,
                CorsConfiguration::new(vec![rule(&["*"], &["PATCH"], &[])])
            ),
            Err(AccessError::InvalidRequest { .. })
        ));
        assert!(matches!(
            service.put_bucket_cors(
                &as_alice(),
                &bucket,
                CorsConfiguration::new(vec![rule(&["https://*.*.example.com"], &["GET"], &[])])
            ),
            Err(AccessError::InvalidRequest { .. })
        ));
        assert!(matches!(
            service.put_bucket_cors(
                &as_alice(),
                &bucket,
                CorsConfiguration::new(vec![rule(&[], &["GET"], &[])])
            ),
            Err(AccessError::MalformedXml { .. })
        ));
    }

    #[test]
    fn test_should_cap_rule_count() {
        let service = service_with(AccessConfig::builder().max_cors_rules(2).build());
        let bucket = create_test_bucket(&service, "cors-cap");
        let rules = (0..3)
            .map(|i| {
                let origin = format!("https://site{i}.example.com");
                rule(&[origin.as_str()], &["GET"], &[])
            })
            .collect();

        assert!(matches!(
            service.put_bucket_cors(&as_alice(), &bucket, CorsConfiguration::new(rules)),
            Err(AccessError::MalformedXml { .. })
        ));
    }

    #[test]
    fn test_should_answer_matching_preflight() {
        let service = service();
        let bucket = create_test_bucket(&service, "cors-preflight");
        service
            .put_bucket_cors(&as_alice(), &bucket, site_config())
            .expect("put cors");

        let allowed = service
            .cors_preflight(
                &bucket,
                Some("https://app.example.com"),
                Some("PUT"),
                &headers(&["content-type", "X-Amz-Meta-Owner"]),
            )
            .expect("preflight allowed");
        assert_eq!(allowed.allow_origin, "https://app.example.com");
        assert_eq!(allowed.allow_methods, vec!["GET", "PUT"]);
        assert_eq!(allowed.allow_headers, headers(&["content-type", "X-Amz-Meta-Owner"]));
        assert_eq!(allowed.max_age_seconds, Some(600));
        assert!(allowed.allow_credentials);

        let map = allowed.to_header_map();
        assert_eq!(
            map.get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("https://app.example.com")
        );
        assert_eq!(
            map.get(http::header::VARY).and_then(|v| v.to_str().ok()),
            Some("Origin")
        );

        let wildcard = service
            .cors_preflight(&bucket, Some("https://cdn.example.org"), Some("GET"), &[])
            .expect("wildcard origin allowed");
        assert_eq!(wildcard.allow_origin, "https://cdn.example.org");
    }

    #[test]
    fn test_should_reject_non_matching_preflight() {
        let service = service();
        let bucket = create_test_bucket(&service, "cors-reject");

        assert!(matches!(
            service.cors_preflight(&bucket, Some("https://app.example.com"), Some("GET"), &[]),
            Err(AccessError::CorsForbidden)
        ));

        service
            .put_bucket_cors(&as_alice(), &bucket, site_config())
            .expect("put cors");

        let cases = [
            (Some("https://evil.example.com"), Some("GET"), headers(&[])),
            (Some("https://app.example.com"), Some("DELETE"), headers(&[])),
            (Some("https://app.example.com"), Some("put"), headers(&[])),
            (Some("https://cdn.example.org"), Some("GET"), headers(&["authorization"])),
            (Some("https://app.example.com"), None, headers(&[])),
        ];
        for (origin, method, requested) in &cases {
            assert!(
                matches!(
                    service.cors_preflight(&bucket, *origin, *method, requested),
                    Err(AccessError::CorsForbidden)
                ),
                "preflight should be rejected: {origin:?} {method:?} {requested:?}"
            );
        }

        assert!(matches!(
            service.cors_preflight(&bucket, None, Some("GET"), &[]),
            Err(AccessError::BadRequest { .. })
        ));
        assert!(matches!(
            service.cors_preflight("no-such-bucket-cors", Some("https://a.com"), Some("GET"), &[]),
            Err(AccessError::NoSuchBucket { .. })
        ));
    }

    #[test]
    fn test_should_use_first_matching_rule() {
        let service = service();
        let bucket = create_test_bucket(&service, "cors-order");
        let config = CorsConfiguration::new(vec![
            rule(&["*"], &["GET"], &[]),
            rule(&["https://app.example.com"], &["GET", "PUT"], &["*"]),
        ]);
        service
            .put_bucket_cors(&as_alice(), &bucket, config)
            .expect("put cors");

        let get = service
            .cors_preflight(&bucket, Some("https://app.example.com"), Some("GET"), &[])
            .expect("get preflight");
        assert_eq!(get.allow_origin, "*");
        assert!(!get.allow_credentials);

        let put = service
            .cors_preflight(
                &bucket,
                Some("https://app.example.com"),
                Some("PUT"),
                &headers(&["x-custom"]),
            )
            .expect("put preflight");
        assert_eq!(put.allow_origin, "https://app.example.com");
        assert_eq!(put.allow_headers, headers(&["x-custom"]));
    }

    #[test]
    fn test_should_decorate_actual_requests() {
        let service = service();
        let bucket = create_test_bucket(&service, "cors-actual");

        assert!(
            service
                .cors_actual(&bucket, Some("https://app.example.com"), "GET")
                .expect("no configuration")
                .is_none()
        );

        service
            .put_bucket_cors(&as_alice(), &bucket, site_config())
            .expect("put cors");

        let decorated = service
            .cors_actual(&bucket, Some("https://app.example.com"), "GET")
            .expect("actual request")
            .expect("matching rule");
        assert_eq!(decorated.allow_origin, "https://app.example.com");
        assert_eq!(decorated.expose_headers, vec!["ETag"]);
        assert_eq!(decorated.max_age_seconds, None);

        assert!(
            service
                .cors_actual(&bucket, Some("https://evil.example.com"), "GET")
                .expect("actual request")
                .is_none()
        );
        assert!(
            service
                .cors_actual(&bucket, None, "GET")
                .expect("actual request")
                .is_none()
        );
    }
}
