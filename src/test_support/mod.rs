pub(crate) mod fake_shards;
pub(crate) mod socket_guard;
