/// OpenAPI documentation generation.
pub mod documentation;
/// Game record lifecycle: id allocation, turns and termination.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Background storage connection supervisor.
pub mod storage_supervisor;
