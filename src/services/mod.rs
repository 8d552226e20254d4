// Linkboard services
// Services are stateless helpers or store-backed components: insertion-point
// resolution, snapshot persistence, seed intake and link utilities.

pub mod insertion_resolver;
pub mod link_utils;
pub mod persistence_gateway;
pub mod seed_import;
