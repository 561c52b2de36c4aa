mod routes;

pub use routes::{LeaderboardEntry, MyRank, routes};
