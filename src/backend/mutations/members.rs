//! Membership rules
//!
//! - add: owner or editor, by email, as `EDITOR` or `VIEWER`
//! - change role: owner only, never to or from `OWNER`
//! - remove: the owner removes anyone but themselves, an editor removes
//!   viewers, and any non-owner may leave on their own

use uuid::Uuid;

use crate::backend::access::{require_editor, require_member, resolve_access};
use crate::backend::error::BackendError;
use crate::backend::mutations::{MutationOutcome, RoomEffect};
use crate::backend::store::BoardStore;
use crate::shared::api::{AddMemberRequest, UpdateMemberRoleRequest};
use crate::shared::{BoardMember, Role, ServerEvent, User};

async fn load_member(
    store: &dyn BoardStore,
    board_id: Uuid,
    member_id: Uuid,
) -> Result<BoardMember, BackendError> {
    store
        .get_member_by_id(member_id)
        .await?
        .filter(|member| member.board_id == board_id)
        .ok_or_else(|| BackendError::not_found("Member not found"))
}

fn reject_owner_role(role: Role) -> Result<(), BackendError> {
    if role == Role::Owner {
        return Err(BackendError::validation("role", "The OWNER role cannot be assigned"));
    }
    Ok(())
}

pub async fn list_members(
    store: &dyn BoardStore,
    actor: &User,
    board_id: Uuid,
) -> Result<Vec<BoardMember>, BackendError> {
    require_member(store, board_id, actor.id).await?;
    Ok(store.members_for_board(board_id).await?)
}

pub async fn add_member(
    store: &dyn BoardStore,
    actor: &User,
    board_id: Uuid,
    request: AddMemberRequest,
) -> Result<MutationOutcome<BoardMember>, BackendError> {
    require_editor(store, board_id, actor.id).await?;
    reject_owner_role(request.role)?;

    let email = request.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(BackendError::validation("email", "Email is required"));
    }
    let user = store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    let member = store.add_member(board_id, &user, request.role).await?;
    tracing::info!(%board_id, user_id = %user.id, role = %member.role, "[Board] Member added");
    let event = ServerEvent::MemberAdded {
        member: member.clone(),
        user_id: actor.id,
    };
    Ok(MutationOutcome::new(member, board_id, event))
}

pub async fn update_member_role(
    store: &dyn BoardStore,
    actor: &User,
    board_id: Uuid,
    member_id: Uuid,
    request: UpdateMemberRoleRequest,
) -> Result<MutationOutcome<BoardMember>, BackendError> {
    let access = resolve_access(store, board_id, actor.id, false).await?.require()?;
    if !access.is_owner {
        return Err(BackendError::forbidden("Only the board owner can change roles"));
    }
    let member = load_member(store, board_id, member_id).await?;
    if member.role == Role::Owner {
        return Err(BackendError::forbidden("The owner's role cannot be changed"));
    }
    reject_owner_role(request.role)?;

    let member = store.update_member_role(member_id, request.role).await?;
    let event = ServerEvent::MemberUpdated {
        member: member.clone(),
        user_id: actor.id,
    };
    Ok(MutationOutcome::new(member, board_id, event))
}

pub async fn remove_member(
    store: &dyn BoardStore,
    actor: &User,
    board_id: Uuid,
    member_id: Uuid,
) -> Result<MutationOutcome<BoardMember>, BackendError> {
    let access = resolve_access(store, board_id, actor.id, false).await?.require()?;
    let member = load_member(store, board_id, member_id).await?;

    if member.role == Role::Owner {
        return Err(BackendError::forbidden("The board owner cannot be removed"));
    }
    let allowed = member.user_id == actor.id
        || access.is_owner
        || (access.role == Some(Role::Editor) && member.role == Role::Viewer);
    if !allowed {
        return Err(BackendError::forbidden("You cannot remove this member"));
    }

    let removed = store.remove_member(member_id).await?;
    tracing::info!(%board_id, user_id = %removed.user_id, "[Board] Member removed");
    let event = ServerEvent::MemberRemoved {
        board_id,
        member_id,
        user_id: actor.id,
    };
    let evicted = removed.user_id;
    Ok(MutationOutcome::new(removed, board_id, event).with_room_effect(RoomEffect::EvictUser(evicted)))
}
