//! Bucket policy integration tests.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use bucketgate_access::{AccessBasis, AccessError, ConditionContext, RequestContext, S3Action};
    use serde_json::json;

    use crate::{alice, bob, create_test_bucket, service};

    fn as_alice() -> RequestContext {
        RequestContext::user(alice())
    }

    fn put_policy(
        service: &bucketgate_access::AccessService,
        bucket: &str,
        policy: &serde_json::Value,
    ) {
        service
            .put_bucket_policy(&as_alice(), bucket, &policy.to_string())
            .expect("put policy");
    }

    fn put_private_object(service: &bucketgate_access::AccessService, bucket: &str, key: &str) {
        service
            .put_object(&as_alice(), bucket, key, None, BTreeMap::new())
            .expect("put object");
    }

    #[test]
    fn test_should_grant_public_read_through_policy() {
        let service = service();
        let bucket = create_test_bucket(&service, "policy-read");
        put_private_object(&service, &bucket, "index.html");
        put_policy(
            &service,
            &bucket,
            &json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": "*",
                    "Action": "s3:GetObject",
                    "Resource": format!("arn:aws:s3:::{bucket}/*"),
                }]
            }),
        );

        let req = service
            .authorize(
                &RequestContext::anonymous(),
                &bucket,
                Some("index.html"),
                S3Action::GetObject,
            )
            .expect("anonymous get");
        assert_eq!(req.authorization.basis, AccessBasis::Policy);

        // The policy names objects only.
        assert!(matches!(
            service.list_objects(&RequestContext::anonymous(), &bucket),
            Err(AccessError::AccessDenied)
        ));
        assert!(
            service
                .get_bucket_policy_status(&as_alice(), &bucket)
                .expect("policy status")
        );
    }

    #[test]
    fn test_should_reveal_missing_keys_to_policy_listers() {
        let service = service();
        let bucket = create_test_bucket(&service, "policy-missing");
        put_policy(
            &service,
            &bucket,
            &json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": {"CanonicalUser": bob().id.as_str()},
                    "Action": ["s3:ListBucket", "s3:GetObject"],
                    "Resource": [
                        format!("arn:aws:s3:::{bucket}"),
                        format!("arn:aws:s3:::{bucket}/*"),
                    ],
                }, {
                    "Effect": "Allow",
                    "Principal": "*",
                    "Action": "s3:GetObject",
                    "Resource": format!("arn:aws:s3:::{bucket}/*"),
                }]
            }),
        );

        assert!(matches!(
            service.get_object(&RequestContext::user(bob()), &bucket, "missing"),
            Err(AccessError::NoSuchKey { .. })
        ));
        assert!(matches!(
            service.get_object(&RequestContext::anonymous(), &bucket, "missing"),
            Err(AccessError::AccessDenied)
        ));
    }

    #[test]
    fn test_should_let_explicit_deny_override_owner_and_acl() {
        let service = service();
        let bucket = create_test_bucket(&service, "policy-deny");
        put_private_object(&service, &bucket, "secret.txt");
        put_policy(
            &service,
            &bucket,
            &json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Sid": "NoReads",
                    "Effect": "Deny",
                    "Principal": {"AWS": "*"},
                    "Action": ["s3:GetObject", "s3:ListBucket"],
                    "Resource": [
                        format!("arn:aws:s3:::{bucket}"),
                        format!("arn:aws:s3:::{bucket}/*"),
                    ],
                }]
            }),
        );

        assert!(matches!(
            service.get_object(&as_alice(), &bucket, "secret.txt"),
            Err(AccessError::AccessDenied)
        ));
        assert!(matches!(
            service.list_objects(&as_alice(), &bucket),
            Err(AccessError::AccessDenied)
        ));

        // Statements not naming the action leave the owner in charge.
        service
            .delete_bucket_policy(&as_alice(), &bucket)
            .expect("delete policy");
        service
            .get_object(&as_alice(), &bucket, "secret.txt")
            .expect("owner get after delete");
    }

    #[test]
    fn test_should_match_canonical_user_and_account_principals() {
        let service = service();
        let bucket = create_test_bucket(&service, "policy-principal");
        put_policy(
            &service,
            &bucket,
            &json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": {"AWS": format!("arn:aws:iam::{}:root", bob().id)},
                    "Action": "s3:ListBucket",
                    "Resource": format!("arn:aws:s3:::{bucket}"),
                }, {
                    "Effect": "Allow",
                    "Principal": {"CanonicalUser": bob().id.as_str()},
                    "Action": "s3:PutObject",
                    "Resource": format!("arn:aws:s3:::{bucket}/uploads/*"),
                }]
            }),
        );

        let bob = RequestContext::user(bob());
        service.list_objects(&bob, &bucket).expect("bob list");
        service
            .put_object(&bob, &bucket, "uploads/a.txt", None, BTreeMap::new())
            .expect("bob upload");
        assert!(matches!(
            service.put_object(&bob, &bucket, "root.txt", None, BTreeMap::new()),
            Err(AccessError::AccessDenied)
        ));
        assert!(matches!(
            service.list_objects(&RequestContext::anonymous(), &bucket),
            Err(AccessError::AccessDenied)
        ));
        assert!(
            !service
                .get_bucket_policy_status(&as_alice(), &bucket)
                .expect("policy status")
        );
    }

    #[test]
    fn test_should_evaluate_source_ip_condition() {
        let service = service();
        let bucket = create_test_bucket(&service, "policy-ip");
        put_private_object(&service, &bucket, "report.pdf");
        put_policy(
            &service,
            &bucket,
            &json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": "*",
                    "Action": "s3:GetObject",
                    "Resource": format!("arn:aws:s3:::{bucket}/*"),
                    "Condition": {"IpAddress": {"aws:SourceIp": "192.168.0.0/16"}},
                }]
            }),
        );

        let inside = RequestContext::anonymous()
            .with_conditions(ConditionContext::new().with("aws:SourceIp", "192.168.10.20"));
        let outside = RequestContext::anonymous()
            .with_conditions(ConditionContext::new().with("aws:SourceIp", "10.0.0.1"));

        service
            .get_object(&inside, &bucket, "report.pdf")
            .expect("inside range");
        assert!(matches!(
            service.get_object(&outside, &bucket, "report.pdf"),
            Err(AccessError::AccessDenied)
        ));
        assert!(matches!(
            service.get_object(&RequestContext::anonymous(), &bucket, "report.pdf"),
            Err(AccessError::AccessDenied)
        ));
        // A conditioned wildcard grant is not public.
        assert!(
            !service
                .get_bucket_policy_status(&as_alice(), &bucket)
                .expect("policy status")
        );
    }

    #[test]
    fn test_should_condition_on_existing_object_tags() {
        let service = service();
        let bucket = create_test_bucket(&service, "policy-tags");
        service
            .put_object(
                &as_alice(),
                &bucket,
                "shared.txt",
                None,
                BTreeMap::from([("visibility".to_owned(), "public".to_owned())]),
            )
            .expect("put tagged object");
        put_private_object(&service, &bucket, "private.txt");
        put_policy(
            &service,
            &bucket,
            &json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": {"AWS": "*"},
                    "Action": "s3:GetObject",
                    "Resource": format!("arn:aws:s3:::{bucket}/*"),
                    "Condition": {
                        "StringEquals": {"s3:ExistingObjectTag/visibility": "public"}
                    },
                }]
            }),
        );

        let bob = RequestContext::user(bob());
        service
            .get_object(&bob, &bucket, "shared.txt")
            .expect("tagged object readable");
        assert!(matches!(
            service.get_object(&bob, &bucket, "private.txt"),
            Err(AccessError::AccessDenied)
        ));

        service
            .delete_object_tagging(&as_alice(), &bucket, "shared.txt")
            .expect("delete tags");
        assert!(matches!(
            service.get_object(&bob, &bucket, "shared.txt"),
            Err(AccessError::AccessDenied)
        ));
    }

    #[test]
    fn test_should_deny_insecure_transport() {
        let service = service();
        let bucket = create_test_bucket(&service, "policy-tls");
        put_private_object(&service, &bucket, "k");
        put_policy(
            &service,
            &bucket,
            &json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Deny",
                    "Principal": "*",
                    "Action": "s3:*",
                    "Resource": format!("arn:aws:s3:::{bucket}/*"),
                    "Condition": {"Bool": {"aws:SecureTransport": "false"}},
                }]
            }),
        );

        let plain = RequestContext::user(alice())
            .with_conditions(ConditionContext::new().with("aws:SecureTransport", "false"));
        let secure = RequestContext::user(alice())
            .with_conditions(ConditionContext::new().with("aws:SecureTransport", "true"));

        assert!(matches!(
            service.get_object(&plain, &bucket, "k"),
            Err(AccessError::AccessDenied)
        ));
        service.get_object(&secure, &bucket, "k").expect("secure get");
    }

    #[test]
    fn test_should_reject_malformed_policies() {
        let service = service();
        let bucket = create_test_bucket(&service, "policy-bad");
        let resource = format!("arn:aws:s3:::{bucket}/*");

        let cases = [
            "not json".to_owned(),
            json!({"Version": "2012-10-17", "Statement": []}).to_string(),
            json!({
                "Statement": [{
                    "Effect": "allow",
                    "Principal": "*",
                    "Action": "s3:GetObject",
                    "Resource": resource,
                }]
            })
            .to_string(),
            json!({
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": "*",
                    "Action": "s3:GetObject",
                    "Resource": "arn:aws:s3:::some-other-bucket/*",
                }]
            })
            .to_string(),
            json!({
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": "*",
                    "Action": "s3:GetObject",
                    "Resource": resource,
                    "Condition": {"StringSortOf": {"aws:Referer": "x"}},
                }]
            })
            .to_string(),
            json!({
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": "*",
                    "Action": "s3:GetObject",
                    "Resource": resource,
                    "Extra": true,
                }]
            })
            .to_string(),
        ];

        for text in &cases {
            assert!(
                matches!(
                    service.put_bucket_policy(&as_alice(), &bucket, text),
                    Err(AccessError::MalformedPolicy { .. })
                ),
                "policy should be rejected: {text}"
            );
        }
        assert!(matches!(
            service.get_bucket_policy(&as_alice(), &bucket),
            Err(AccessError::NoSuchBucketPolicy)
        ));
    }

    #[test]
    fn test_should_return_policy_as_written() {
        let service = service();
        let bucket = create_test_bucket(&service, "policy-raw");
        let text = format!(
            r#"{{"Version":"2012-10-17","Id":"raw","Statement":{{"Effect":"Allow","Principal":"*","Action":"s3:GetObject","Resource":"arn:aws:s3:::{bucket}/*"}}}}"#
        );

        service
            .put_bucket_policy(&as_alice(), &bucket, &text)
            .expect("put policy");
        assert_eq!(
            service
                .get_bucket_policy(&as_alice(), &bucket)
                .expect("get policy"),
            text
        );
        assert!(matches!(
            service.get_bucket_policy(&RequestContext::user(bob()), &bucket),
            Err(AccessError::AccessDenied)
        ));
    }
}
