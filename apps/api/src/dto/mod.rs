mod associations;
mod auth;
mod common;
mod roles;

pub use associations::{
    AssociationResponse, CreateAssociationRequest, MembershipResponse, ReviewJoinRequest,
};
pub use auth::{OtpRequestRequest, OtpVerifyRequest};
pub use common::{GenericMessageResponse, HealthResponse, UserIdentityResponse};
pub use roles::{
    AssignRolesRequest, CatalogCategoryResponse, CreateRoleRequest, MemberRolesResponse,
    PermissionDefinitionResponse, PermissionOverrideRequest, RoleResponse, TransferAdminRequest,
    UpdateRoleRequest,
};
