//! Pre-signed URL and request identification integration tests.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::net::{IpAddr, Ipv4Addr};

    use bucketgate_access::{AccessConfig, AccessError, RequestContext};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::json;

    use crate::{alice, bob, create_test_bucket, service, service_with};

    const SIGNED_AT: &str = "20240101T000000Z";

    fn signed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn parts(uri: &str, authorization: Option<&str>) -> http::request::Parts {
        let mut builder = http::Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(http::header::AUTHORIZATION, value);
        }
        builder.body(()).expect("test request").into_parts().0
    }

    fn v4_url(bucket: &str, key: &str, access_key: &str, expires: i64) -> String {
        format!(
            "/{bucket}/{key}?X-Amz-Algorithm=AWS4-HMAC-SHA256\
             &X-Amz-Credential={access_key}%2F20240101%2Fus-east-1%2Fs3%2Faws4_request\
             &X-Amz-Date={SIGNED_AT}&X-Amz-Expires={expires}\
             &X-Amz-SignedHeaders=host&X-Amz-Signature=deadbeef"
        )
    }

    fn v2_url(bucket: &str, key: &str, access_key: &str, expires: i64) -> String {
        format!("/{bucket}/{key}?AWSAccessKeyId={access_key}&Expires={expires}&Signature=c2ln")
    }

    fn bucket_with_object(service: &bucketgate_access::AccessService) -> String {
        let bucket = create_test_bucket(service, "presigned");
        service
            .put_object(
                &RequestContext::user(alice()),
                &bucket,
                "report.pdf",
                None,
                BTreeMap::new(),
            )
            .expect("put object");
        bucket
    }

    #[test]
    fn test_should_honor_v4_url_until_expiry() {
        let service = service();
        let bucket = bucket_with_object(&service);
        let url = v4_url(&bucket, "report.pdf", crate::ALICE_KEY, 3600);

        let ctx = service
            .request_context(&parts(&url, None), None)
            .expect("identify presigned caller");
        assert_eq!(ctx.caller(), Some(&alice()));

        service
            .get_object(&ctx.clone().at(signed_at() + Duration::minutes(30)), &bucket, "report.pdf")
            .expect("valid before expiry");

        let at_expiry = ctx.clone().at(signed_at() + Duration::hours(1));
        assert!(matches!(
            service.get_object(&at_expiry, &bucket, "report.pdf"),
            Err(AccessError::AuthorizationQueryParametersError { .. })
        ));

        let err = service
            .get_object(&ctx.at(signed_at() + Duration::days(2)), &bucket, "report.pdf")
            .expect_err("expired");
        assert_eq!(err.code(), "AuthorizationQueryParametersError");
        assert_eq!(err.status_code(), http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_should_honor_v2_url_until_expiry() {
        let service = service();
        let bucket = bucket_with_object(&service);
        let expires = signed_at().timestamp() + 600;
        let url = v2_url(&bucket, "report.pdf", crate::ALICE_KEY, expires);

        let ctx = service
            .request_context(&parts(&url, None), None)
            .expect("identify presigned caller");

        service
            .head_object(&ctx.clone().at(signed_at()), &bucket, "report.pdf")
            .expect("valid before expiry");
        assert!(matches!(
            service.head_object(&ctx.at(signed_at() + Duration::seconds(600)), &bucket, "report.pdf"),
            Err(AccessError::AuthorizationQueryParametersError { .. })
        ));
    }

    #[test]
    fn test_should_treat_epoch_expiry_as_expired() {
        let service = service();
        let bucket = bucket_with_object(&service);
        let url = v2_url(&bucket, "report.pdf", crate::ALICE_KEY, 0);

        let ctx = service
            .request_context(&parts(&url, None), None)
            .expect("identify presigned caller");
        assert!(matches!(
            service.get_object(&ctx, &bucket, "report.pdf"),
            Err(AccessError::AuthorizationQueryParametersError { .. })
        ));
    }

    #[test]
    fn test_should_reject_lifetime_outside_limits() {
        let service = service();
        let bucket = bucket_with_object(&service);

        for expires in [604_801, 0, -3600, -9_999_999_999_999_999, i64::MIN] {
            let url = v4_url(&bucket, "report.pdf", crate::ALICE_KEY, expires);
            assert!(
                matches!(
                    service.request_context(&parts(&url, None), None),
                    Err(AccessError::AuthorizationQueryParametersError { .. })
                ),
                "X-Amz-Expires={expires} should be rejected"
            );
        }

        let strict = service_with(AccessConfig::builder().max_presigned_expires(60).build());
        let url = v4_url(&bucket, "report.pdf", crate::ALICE_KEY, 3600);
        assert!(matches!(
            strict.request_context(&parts(&url, None), None),
            Err(AccessError::AuthorizationQueryParametersError { .. })
        ));
    }

    #[test]
    fn test_should_still_require_signer_permission() {
        let service = service();
        let bucket = bucket_with_object(&service);
        let url = v4_url(&bucket, "report.pdf", crate::BOB_KEY, 3600);

        let ctx = service
            .request_context(&parts(&url, None), None)
            .expect("identify presigned caller")
            .at(signed_at());
        assert_eq!(ctx.caller(), Some(&bob()));
        assert!(matches!(
            service.get_object(&ctx, &bucket, "report.pdf"),
            Err(AccessError::AccessDenied)
        ));
    }

    #[test]
    fn test_should_reject_unknown_access_key() {
        let service = service();
        let url = v2_url("bucket", "key", "AKIDUNKNOWN", 2_000_000_000);

        assert!(matches!(
            service.request_context(&parts(&url, None), None),
            Err(AccessError::InvalidAccessKeyId { .. })
        ));
        assert!(matches!(
            service.request_context(&parts("/bucket/key", Some("AWS AKIDUNKNOWN:c2ln")), None),
            Err(AccessError::InvalidAccessKeyId { .. })
        ));
    }

    #[test]
    fn test_should_identify_header_callers_and_anonymous() {
        let service = service();

        let v4 = format!(
            "AWS4-HMAC-SHA256 Credential={}/20240101/us-east-1/s3/aws4_request, \
             SignedHeaders=host, Signature=deadbeef",
            crate::BOB_KEY
        );
        let ctx = service
            .request_context(&parts("/bucket/key", Some(&v4)), None)
            .expect("sigv4 header");
        assert_eq!(ctx.caller(), Some(&bob()));
        assert!(ctx.identity.presigned.is_none());

        let v2 = format!("AWS {}:c2ln", crate::ALICE_KEY);
        let ctx = service
            .request_context(&parts("/bucket/key", Some(&v2)), None)
            .expect("sigv2 header");
        assert_eq!(ctx.caller(), Some(&alice()));

        let ctx = service
            .request_context(&parts("/bucket/key", None), None)
            .expect("anonymous");
        assert!(ctx.caller().is_none());

        assert!(matches!(
            service.request_context(&parts("/bucket/key", Some("Bearer token")), None),
            Err(AccessError::AuthorizationHeaderMalformed { .. })
        ));
    }

    #[test]
    fn test_should_feed_request_conditions_to_policy() {
        let service = service();
        let bucket = bucket_with_object(&service);
        let policy = json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
                "Resource": format!("arn:aws:s3:::{bucket}/*"),
                "Condition": {"IpAddress": {"aws:SourceIp": "203.0.113.0/24"}},
            }]
        });
        service
            .put_bucket_policy(&RequestContext::user(alice()), &bucket, &policy.to_string())
            .expect("put policy");

        let uri = format!("/{bucket}/report.pdf");
        let office = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7));
        let elsewhere = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 7));

        let ctx = service
            .request_context(&parts(&uri, None), Some(office))
            .expect("anonymous from office");
        service
            .get_object(&ctx, &bucket, "report.pdf")
            .expect("allowed from office");

        let ctx = service
            .request_context(&parts(&uri, None), Some(elsewhere))
            .expect("anonymous from elsewhere");
        assert!(matches!(
            service.get_object(&ctx, &bucket, "report.pdf"),
            Err(AccessError::AccessDenied)
        ));
    }
}
