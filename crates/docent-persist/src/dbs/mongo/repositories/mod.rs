pub mod project;
pub mod turn;

pub use project::MongoProjectRepository;
pub use turn::MongoTurnRepository;
