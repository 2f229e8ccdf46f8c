//! ACL and canned-ACL integration tests.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use bucketgate_access::{
        AccessError, AclSource, CannedAcl, Grant, Grantee, Group, ObjectOwnership, Permission,
        RequestContext,
    };

    use crate::{BOB_EMAIL, alice, bob, create_test_bucket, service, stranger_id, test_bucket_name};

    fn as_alice() -> RequestContext {
        RequestContext::user(alice())
    }

    fn as_bob() -> RequestContext {
        RequestContext::user(bob())
    }

    fn anonymous() -> RequestContext {
        RequestContext::anonymous()
    }

    fn canned(acl: CannedAcl) -> Option<AclSource> {
        Some(AclSource::Canned(acl))
    }

    #[test]
    fn test_should_keep_private_bucket_to_its_owner() {
        let service = service();
        let bucket = create_test_bucket(&service, "private");

        service.head_bucket(&as_alice(), &bucket).expect("owner head");
        assert!(matches!(
            service.head_bucket(&as_bob(), &bucket),
            Err(AccessError::AccessDenied)
        ));
        assert!(matches!(
            service.list_objects(&anonymous(), &bucket),
            Err(AccessError::AccessDenied)
        ));

        let acl = service.get_bucket_acl(&as_alice(), &bucket).expect("get acl");
        assert_eq!(acl.owner, alice());
        assert_eq!(
            acl.grants,
            vec![Grant::new(Grantee::user(&alice()), Permission::FullControl)]
        );
    }

    #[test]
    fn test_should_open_public_read_bucket_for_listing_only() {
        let service = service();
        let bucket = test_bucket_name("pubread");
        service
            .create_bucket(&as_alice(), &bucket, canned(CannedAcl::PublicRead), None)
            .expect("create bucket");

        assert!(
            service
                .list_objects(&anonymous(), &bucket)
                .expect("anonymous list")
                .is_empty()
        );
        assert!(matches!(
            service.put_object(&anonymous(), &bucket, "k", None, BTreeMap::new()),
            Err(AccessError::AccessDenied)
        ));
        assert!(matches!(
            service.get_bucket_acl(&anonymous(), &bucket),
            Err(AccessError::AccessDenied)
        ));
    }

    #[test]
    fn test_should_give_anonymous_uploads_to_bucket_owner() {
        let service = service();
        let bucket = test_bucket_name("pubrw");
        service
            .create_bucket(&as_alice(), &bucket, canned(CannedAcl::PublicReadWrite), None)
            .expect("create bucket");

        service
            .put_object(&anonymous(), &bucket, "drop.txt", None, BTreeMap::new())
            .expect("anonymous put");

        let object = service
            .get_object(&as_alice(), &bucket, "drop.txt")
            .expect("owner get");
        assert_eq!(object.owner, alice());

        // The object ACL is private to its owner, so the uploader cannot read it back.
        assert!(matches!(
            service.get_object(&anonymous(), &bucket, "drop.txt"),
            Err(AccessError::AccessDenied)
        ));
    }

    #[test]
    fn test_should_let_writer_own_uploaded_object() {
        let service = service();
        let bucket = test_bucket_name("writer");
        service
            .create_bucket(&as_alice(), &bucket, canned(CannedAcl::PublicReadWrite), None)
            .expect("create bucket");

        service
            .put_object(&as_bob(), &bucket, "bob.txt", None, BTreeMap::new())
            .expect("bob put");

        let acl = service
            .get_object_acl(&as_bob(), &bucket, "bob.txt")
            .expect("bob get acl");
        assert_eq!(acl.owner, bob());

        // The bucket owner holds no grant on an object it does not own.
        assert!(matches!(
            service.get_object(&as_alice(), &bucket, "bob.txt"),
            Err(AccessError::AccessDenied)
        ));
    }

    #[test]
    fn test_should_resolve_email_grantee_to_canonical_user() {
        let service = service();
        let bucket = create_test_bucket(&service, "email");

        let grants = vec![Grant::new(
            Grantee::Email {
                address: BOB_EMAIL.to_owned(),
            },
            Permission::Read,
        )];
        service
            .put_bucket_acl(&as_alice(), &bucket, AclSource::Grants(grants))
            .expect("put acl");

        let acl = service.get_bucket_acl(&as_alice(), &bucket).expect("get acl");
        assert_eq!(acl.grants, vec![Grant::new(Grantee::user(&bob()), Permission::Read)]);

        service.list_objects(&as_bob(), &bucket).expect("bob list");
        assert!(matches!(
            service.get_bucket_acl(&as_bob(), &bucket),
            Err(AccessError::AccessDenied)
        ));
    }

    #[test]
    fn test_should_reject_unknown_grantees() {
        let service = service();
        let bucket = create_test_bucket(&service, "unknown");

        let by_id = vec![Grant::new(
            Grantee::CanonicalUser {
                id: stranger_id(),
                display_name: None,
            },
            Permission::Read,
        )];
        assert!(matches!(
            service.put_bucket_acl(&as_alice(), &bucket, AclSource::Grants(by_id)),
            Err(AccessError::InvalidArgument { .. })
        ));

        let by_email = vec![Grant::new(
            Grantee::Email {
                address: "nobody@example.com".to_owned(),
            },
            Permission::Read,
        )];
        assert!(matches!(
            service.put_bucket_acl(&as_alice(), &bucket, AclSource::Grants(by_email)),
            Err(AccessError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_should_accept_grant_headers() {
        let service = service();
        let bucket = create_test_bucket(&service, "headers");

        let mut headers = http::HeaderMap::new();
        headers.insert(
            "x-amz-grant-read",
            http::HeaderValue::from_static(
                "uri=\"http://acs.amazonaws.com/groups/global/AuthenticatedUsers\"",
            ),
        );
        let source = AclSource::from_headers(&headers)
            .expect("parse headers")
            .expect("grant present");
        service
            .put_bucket_acl(&as_alice(), &bucket, source)
            .expect("put acl");

        service.list_objects(&as_bob(), &bucket).expect("authenticated list");
        assert!(matches!(
            service.list_objects(&anonymous(), &bucket),
            Err(AccessError::AccessDenied)
        ));

        let acl = service.get_bucket_acl(&as_alice(), &bucket).expect("get acl");
        assert!(acl.grants.contains(&Grant::new(
            Grantee::Group {
                uri: Group::AuthenticatedUsers
            },
            Permission::Read
        )));
    }

    #[test]
    fn test_should_apply_object_acl_independently_of_bucket_acl() {
        let service = service();
        let bucket = create_test_bucket(&service, "objacl");

        service
            .put_object(
                &as_alice(),
                &bucket,
                "shared.txt",
                canned(CannedAcl::AuthenticatedRead),
                BTreeMap::new(),
            )
            .expect("put object");

        service
            .get_object(&as_bob(), &bucket, "shared.txt")
            .expect("authenticated get");
        assert!(matches!(
            service.get_object(&anonymous(), &bucket, "shared.txt"),
            Err(AccessError::AccessDenied)
        ));
        // Reading the object does not imply listing the bucket.
        assert!(matches!(
            service.list_objects(&as_bob(), &bucket),
            Err(AccessError::AccessDenied)
        ));

        service
            .put_object_acl(
                &as_alice(),
                &bucket,
                "shared.txt",
                AclSource::Canned(CannedAcl::Private),
            )
            .expect("put object acl");
        assert!(matches!(
            service.get_object(&as_bob(), &bucket, "shared.txt"),
            Err(AccessError::AccessDenied)
        ));
    }

    #[test]
    fn test_should_hide_missing_keys_from_callers_who_cannot_list() {
        let service = service();
        let bucket = create_test_bucket(&service, "missing");

        assert!(matches!(
            service.get_object(&as_alice(), &bucket, "nope"),
            Err(AccessError::NoSuchKey { .. })
        ));
        assert!(matches!(
            service.get_object(&as_bob(), &bucket, "nope"),
            Err(AccessError::AccessDenied)
        ));

        service
            .put_bucket_acl(&as_alice(), &bucket, AclSource::Canned(CannedAcl::PublicRead))
            .expect("put acl");
        assert!(matches!(
            service.head_object(&anonymous(), &bucket, "nope"),
            Err(AccessError::NoSuchKey { .. })
        ));
    }

    #[test]
    fn test_should_assign_object_to_bucket_owner_when_preferred() {
        let service = service();
        let bucket = test_bucket_name("preferred");
        service
            .create_bucket(
                &as_alice(),
                &bucket,
                canned(CannedAcl::PublicReadWrite),
                Some(ObjectOwnership::BucketOwnerPreferred),
            )
            .expect("create bucket");

        service
            .put_object(
                &as_bob(),
                &bucket,
                "handed-over.txt",
                canned(CannedAcl::BucketOwnerFullControl),
                BTreeMap::new(),
            )
            .expect("put with bucket-owner-full-control");
        service
            .put_object(&as_bob(), &bucket, "kept.txt", None, BTreeMap::new())
            .expect("put without acl");

        let handed = service
            .get_object(&as_alice(), &bucket, "handed-over.txt")
            .expect("owner get");
        assert_eq!(handed.owner, alice());

        let kept = service
            .get_object(&as_bob(), &bucket, "kept.txt")
            .expect("writer get");
        assert_eq!(kept.owner, bob());
    }

    #[test]
    fn test_should_disable_acls_when_bucket_owner_enforced() {
        let service = service();
        let bucket = test_bucket_name("enforced");
        service
            .create_bucket(&as_alice(), &bucket, canned(CannedAcl::PublicReadWrite), None)
            .expect("create bucket");
        service
            .put_bucket_ownership_controls(
                &as_alice(),
                &bucket,
                ObjectOwnership::BucketOwnerEnforced,
            )
            .expect("put ownership");

        // Existing grants still decide access; new objects go to the bucket owner.
        service
            .put_object(&as_bob(), &bucket, "k", None, BTreeMap::new())
            .expect("bob put");
        let object = service.get_object(&as_alice(), &bucket, "k").expect("owner get");
        assert_eq!(object.owner, alice());

        assert!(matches!(
            service.put_object(
                &as_bob(),
                &bucket,
                "k2",
                canned(CannedAcl::AuthenticatedRead),
                BTreeMap::new()
            ),
            Err(AccessError::AccessDenied)
        ));

        let grants = vec![Grant::new(Grantee::user(&bob()), Permission::Read)];
        assert!(matches!(
            service.put_bucket_acl(&as_alice(), &bucket, AclSource::Grants(grants)),
            Err(AccessError::AccessControlListNotSupported)
        ));
        service
            .put_bucket_acl(&as_alice(), &bucket, AclSource::Canned(CannedAcl::Private))
            .expect("owner-only acl accepted");

        assert_eq!(
            service
                .get_bucket_ownership_controls(&as_alice(), &bucket)
                .expect("get ownership"),
            ObjectOwnership::BucketOwnerEnforced
        );
    }

    #[test]
    fn test_should_reject_non_owner_acl_on_enforced_bucket_creation() {
        let service = service();
        let bucket = test_bucket_name("enforced-create");

        assert!(matches!(
            service.create_bucket(
                &as_alice(),
                &bucket,
                canned(CannedAcl::PublicRead),
                Some(ObjectOwnership::BucketOwnerEnforced)
            ),
            Err(AccessError::AccessDenied)
        ));
        assert!(matches!(
            service.head_bucket(&as_alice(), &bucket),
            Err(AccessError::NoSuchBucket { .. })
        ));

        service
            .create_bucket(
                &as_alice(),
                &bucket,
                canned(CannedAcl::Private),
                Some(ObjectOwnership::BucketOwnerEnforced),
            )
            .expect("private acl accepted");
    }
}
