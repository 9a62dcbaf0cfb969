use chrono::Duration;
use proptest::prelude::*;
use scribe_core::{render_comment, render_post, Permission, TokenCodec};

fn arb_permission() -> impl Strategy<Value = Permission> {
    (0i32..32).prop_map(Permission::from_stored)
}

proptest! {
    /// Property: a granted permission is always held afterwards
    #[test]
    fn prop_add_then_has(base in arb_permission(), perm in arb_permission()) {
        let mut set = base;
        set.add(perm);
        prop_assert!(set.has(perm));
        prop_assert!(set.has(base));
    }

    /// Property: a revoked permission is never held afterwards (unless empty)
    #[test]
    fn prop_revoke_then_not_has(base in arb_permission(), perm in arb_permission()) {
        prop_assume!(!perm.is_empty());
        let mut set = base;
        set.revoke(perm);
        prop_assert!(!set.has(perm));
    }

    /// Property: stored integers never carry bits beyond ADMIN
    #[test]
    fn prop_from_stored_truncates(bits in any::<i32>()) {
        let perms = Permission::from_stored(bits);
        prop_assert_eq!(perms.bits() & !0b11111, 0);
    }

    /// Property: comment HTML never contains block or script tags
    #[test]
    fn prop_comment_html_is_inline_only(body in ".{0,200}") {
        let html = render_comment(&body);
        prop_assert!(!html.contains("<script"));
        prop_assert!(!html.contains("<p>"));
        prop_assert!(!html.contains("<div"));
        prop_assert!(!html.contains("<h1"));
    }

    /// Property: post HTML never contains executable markup
    #[test]
    fn prop_post_html_has_no_script(body in ".{0,200}") {
        let html = render_post(&body);
        prop_assert!(!html.contains("<script"));
        prop_assert!(!html.contains("<iframe"));
    }

    /// Property: a confirmation token only confirms the account it was issued for
    #[test]
    fn prop_confirmation_binds_user(issued_for in 1i64..10_000, presented_by in 1i64..10_000) {
        let codec = TokenCodec::new("property-secret");
        let token = codec.issue_confirmation(issued_for, Duration::hours(1)).unwrap();
        prop_assert_eq!(codec.verify_confirmation(&token, presented_by), issued_for == presented_by);
    }
}
