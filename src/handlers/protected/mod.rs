// handlers/protected/mod.rs - endpoints behind jwt_auth_middleware
//
// Every handler here can rely on an `AuthUser` request extension. Reads need
// nothing more; handlers that change the repository check the role themselves.
pub mod git;
