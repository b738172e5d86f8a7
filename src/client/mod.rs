// Client side - screen capture, hub API access and the workspace view-model
pub mod api_client;
pub mod capture;
pub mod workspace;
