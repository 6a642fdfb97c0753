pub mod fetcher;

pub use fetcher::{
    FetchedResource, FileSystemFetcher, LoadRequest, MemoryFetcher, ResourceFetcher, ResourceKind,
};
