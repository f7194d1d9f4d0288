//! Storage URL access-class rewriting.
//!
//! Detail documents list storage URLs on private-access hosts
//! (`r1-ndr-private.ykt.cbern.com.cn`); the same objects are served publicly
//! from the matching `-oversea` hosts. The rewrite is a plain token
//! substitution, so any change on the remote side shows up in the pinned
//! examples below.

/// Token marking the private access class in storage hostnames.
pub const PRIVATE_ACCESS_TOKEN: &str = "-private";

/// Token marking the public (oversea) distribution class.
pub const PUBLIC_ACCESS_TOKEN: &str = "-oversea";

/// Rewrites a private-access storage URL into its public-access form.
///
/// URLs without the private token are returned unchanged.
#[must_use]
pub fn to_public_access_url(storage_url: &str) -> String {
    storage_url.replace(PRIVATE_ACCESS_TOKEN, PUBLIC_ACCESS_TOKEN)
}
