// File: drkearn-core/src/services/discord/permissions.rs

use twilight_model::guild::Permissions;
use twilight_model::id::marker::{GuildMarker, RoleMarker, UserMarker};
use twilight_model::id::Id;

/// Whether a guild member holds `ADMINISTRATOR`: the guild owner always does,
/// otherwise any held role (the `@everyone` role shares the guild's id) must
/// grant it.
pub fn is_administrator(
    user_id: Id<UserMarker>,
    guild_id: Id<GuildMarker>,
    owner_id: Id<UserMarker>,
    member_roles: &[Id<RoleMarker>],
    guild_roles: &[(Id<RoleMarker>, Permissions)],
) -> bool {
    if user_id == owner_id {
        return true;
    }

    let everyone = guild_id.cast::<RoleMarker>();
    guild_roles
        .iter()
        .filter(|(role_id, _)| *role_id == everyone || member_roles.contains(role_id))
        .any(|(_, perms)| perms.contains(Permissions::ADMINISTRATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: Id<GuildMarker> = Id::new(100);
    const OWNER: Id<UserMarker> = Id::new(1);
    const MEMBER: Id<UserMarker> = Id::new(2);
    const MOD_ROLE: Id<RoleMarker> = Id::new(10);
    const ADMIN_ROLE: Id<RoleMarker> = Id::new(11);

    fn roles() -> Vec<(Id<RoleMarker>, Permissions)> {
        vec![
            (GUILD.cast(), Permissions::SEND_MESSAGES),
            (MOD_ROLE, Permissions::KICK_MEMBERS | Permissions::BAN_MEMBERS),
            (ADMIN_ROLE, Permissions::ADMINISTRATOR),
        ]
    }

    #[test]
    fn owner_is_always_admin() {
        assert!(is_administrator(OWNER, GUILD, OWNER, &[], &roles()));
    }

    #[test]
    fn admin_role_grants_access() {
        assert!(is_administrator(MEMBER, GUILD, OWNER, &[MOD_ROLE, ADMIN_ROLE], &roles()));
    }

    #[test]
    fn moderator_is_not_admin() {
        assert!(!is_administrator(MEMBER, GUILD, OWNER, &[MOD_ROLE], &roles()));
    }

    #[test]
    fn everyone_role_counts() {
        let roles = vec![(GUILD.cast(), Permissions::ADMINISTRATOR)];
        assert!(is_administrator(MEMBER, GUILD, OWNER, &[], &roles));
    }
}
