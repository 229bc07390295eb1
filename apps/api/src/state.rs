use std::sync::Arc;

use amicale_application::{
    AccessService, AuthenticationProvider, MembershipService, RoleAdminService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access_service: AccessService,
    pub role_admin_service: RoleAdminService,
    pub membership_service: MembershipService,
    pub auth_provider: Arc<dyn AuthenticationProvider>,
    pub frontend_url: String,
}
