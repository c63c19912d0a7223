//! Watchlist flows: creation, membership, items and the random pick.
//!
//! Every operation resolves the caller's role first. Non-members get
//! `Forbidden`, missing lists `NotFound`.

use uuid::Uuid;

use crate::{
    db::{UserStore, WatchlistStore, DUPLICATE_ITEM_MESSAGE},
    error::{AppError, AppResult},
    models::{
        normalize_optional, display_name, AddItemRequest, CreateWatchlistRequest, ItemWithStatus,
        JoinOutcome, JoinPreview, MediaType, MemberRole, UpdateWatchlistRequest, Watchlist,
        WatchlistDetail, WatchlistItem, WatchlistSummary,
    },
    services::{
        catalog::Catalog,
        picker::{self, RandomPick},
    },
};

/// Role given to users who join through an invite link
pub const JOIN_ROLE: MemberRole = MemberRole::Editor;

fn not_found() -> AppError {
    AppError::NotFound("Watchlist not found".to_string())
}

fn validated_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput(
            "Watchlist name cannot be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Loads the list and the caller's role in it
async fn membership(
    store: &dyn WatchlistStore,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<(Watchlist, MemberRole)> {
    let watchlist = store.find(id).await?.ok_or_else(not_found)?;
    let role = store.member_role(id, user_id).await?.ok_or_else(|| {
        AppError::Forbidden("You are not a member of this watchlist".to_string())
    })?;
    Ok((watchlist, role))
}

async fn require_owner(
    store: &dyn WatchlistStore,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<Watchlist> {
    let (watchlist, role) = membership(store, id, user_id).await?;
    if !role.can_manage() {
        return Err(AppError::Forbidden(
            "Only the owner can manage this watchlist".to_string(),
        ));
    }
    Ok(watchlist)
}

async fn require_editor(store: &dyn WatchlistStore, id: Uuid, user_id: Uuid) -> AppResult<()> {
    let (_, role) = membership(store, id, user_id).await?;
    if !role.can_edit_items() {
        return Err(AppError::Forbidden(
            "Viewers cannot change the items of this watchlist".to_string(),
        ));
    }
    Ok(())
}

pub async fn create(
    store: &dyn WatchlistStore,
    owner_id: Uuid,
    request: CreateWatchlistRequest,
) -> AppResult<Watchlist> {
    let name = validated_name(&request.name)?;
    let description = normalize_optional(request.description);

    let watchlist = store
        .create_with_owner(owner_id, name, description, picker::invite_code())
        .await?;

    tracing::info!(watchlist_id = %watchlist.id, owner_id = %owner_id, "Watchlist created");
    Ok(watchlist)
}

pub async fn list_for_user(
    store: &dyn WatchlistStore,
    user_id: Uuid,
) -> AppResult<Vec<WatchlistSummary>> {
    store.list_for_user(user_id).await
}

pub async fn get(
    store: &dyn WatchlistStore,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<WatchlistDetail> {
    let (watchlist, role) = membership(store, id, user_id).await?;
    let members = store.members(id).await?;
    let items = store.items(id, user_id).await?;

    Ok(WatchlistDetail {
        watchlist,
        role,
        members,
        items,
    })
}

/// Renames or redescribes a list. A blank description clears it.
pub async fn update(
    store: &dyn WatchlistStore,
    id: Uuid,
    user_id: Uuid,
    request: UpdateWatchlistRequest,
) -> AppResult<Watchlist> {
    let current = require_owner(store, id, user_id).await?;

    let name = match request.name {
        Some(name) => validated_name(&name)?,
        None => current.name,
    };
    let description = match request.description {
        Some(description) => normalize_optional(Some(description)),
        None => current.description,
    };

    store.update(id, name, description).await
}

pub async fn delete(store: &dyn WatchlistStore, id: Uuid, user_id: Uuid) -> AppResult<()> {
    require_owner(store, id, user_id).await?;
    store.delete(id).await?;
    tracing::info!(watchlist_id = %id, "Watchlist deleted");
    Ok(())
}

/// Adds the caller as an editor. Joining twice is not an error.
pub async fn join(store: &dyn WatchlistStore, id: Uuid, user_id: Uuid) -> AppResult<JoinOutcome> {
    store.find(id).await?.ok_or_else(not_found)?;

    if let Some(role) = store.member_role(id, user_id).await? {
        return Ok(JoinOutcome {
            watchlist_id: id,
            role,
            already_member: true,
        });
    }

    let member = match store.add_member(id, user_id, JOIN_ROLE).await {
        Ok(member) => member,
        // Lost a race with a concurrent join of the same user
        Err(AppError::Conflict(_)) => {
            let role = store.member_role(id, user_id).await?.unwrap_or(JOIN_ROLE);
            return Ok(JoinOutcome {
                watchlist_id: id,
                role,
                already_member: true,
            });
        }
        Err(e) => return Err(e),
    };

    tracing::info!(watchlist_id = %id, user_id = %user_id, "User joined watchlist");
    Ok(JoinOutcome {
        watchlist_id: id,
        role: member.role,
        already_member: false,
    })
}

/// Public summary shown before joining
pub async fn join_preview(
    watchlists: &dyn WatchlistStore,
    users: &dyn UserStore,
    id: Uuid,
    viewer_id: Uuid,
) -> AppResult<JoinPreview> {
    let watchlist = watchlists.find(id).await?.ok_or_else(not_found)?;
    let owner = users.find(watchlist.owner_id).await?;
    let owner_name = match owner {
        Some(owner) => display_name(owner.name.as_deref(), owner.email.as_deref()),
        None => display_name(None, None),
    };
    let already_member = watchlists.member_role(id, viewer_id).await?.is_some();

    Ok(JoinPreview {
        id: watchlist.id,
        name: watchlist.name,
        owner_name,
        already_member,
    })
}

/// Login location for a guest following the join link of `id`
pub fn login_redirect(login_path: &str, id: Uuid) -> String {
    let target = format!("/join/{}", id);
    let separator = if login_path.contains('?') { '&' } else { '?' };
    format!(
        "{}{}redirect={}",
        login_path,
        separator,
        urlencoding::encode(&target)
    )
}

pub async fn leave(store: &dyn WatchlistStore, id: Uuid, user_id: Uuid) -> AppResult<()> {
    let (watchlist, _) = membership(store, id, user_id).await?;
    if watchlist.owner_id == user_id {
        return Err(AppError::InvalidInput(
            "The owner cannot leave a watchlist; delete it instead".to_string(),
        ));
    }
    store.remove_member(id, user_id).await?;
    Ok(())
}

pub async fn remove_member(
    store: &dyn WatchlistStore,
    id: Uuid,
    user_id: Uuid,
    member_id: Uuid,
) -> AppResult<()> {
    let watchlist = require_owner(store, id, user_id).await?;
    if member_id == watchlist.owner_id {
        return Err(AppError::InvalidInput(
            "The owner cannot be removed".to_string(),
        ));
    }
    if !store.remove_member(id, member_id).await? {
        return Err(AppError::NotFound("Member not found".to_string()));
    }
    Ok(())
}

pub async fn set_member_role(
    store: &dyn WatchlistStore,
    id: Uuid,
    user_id: Uuid,
    member_id: Uuid,
    role: MemberRole,
) -> AppResult<()> {
    let watchlist = require_owner(store, id, user_id).await?;
    if role == MemberRole::Owner {
        return Err(AppError::InvalidInput(
            "Ownership cannot be transferred".to_string(),
        ));
    }
    if member_id == watchlist.owner_id {
        return Err(AppError::InvalidInput(
            "The owner's role cannot be changed".to_string(),
        ));
    }
    if !store.set_member_role(id, member_id, role).await? {
        return Err(AppError::NotFound("Member not found".to_string()));
    }
    Ok(())
}

pub async fn list_items(
    store: &dyn WatchlistStore,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<Vec<ItemWithStatus>> {
    membership(store, id, user_id).await?;
    store.items(id, user_id).await
}

pub async fn add_item(
    store: &dyn WatchlistStore,
    id: Uuid,
    user_id: Uuid,
    request: AddItemRequest,
) -> AppResult<WatchlistItem> {
    require_editor(store, id, user_id).await?;

    if store.has_item(id, request.media_id, request.media_type).await? {
        return Err(AppError::Conflict(DUPLICATE_ITEM_MESSAGE.to_string()));
    }

    let item = store
        .add_item(id, request.media_id, request.media_type, user_id)
        .await?;

    tracing::info!(
        watchlist_id = %id,
        media_id = item.media_id,
        media_type = %item.media_type,
        "Item added to watchlist"
    );
    Ok(item)
}

pub async fn remove_item(
    store: &dyn WatchlistStore,
    id: Uuid,
    user_id: Uuid,
    media_id: i64,
    media_type: MediaType,
) -> AppResult<()> {
    require_editor(store, id, user_id).await?;
    if !store.remove_item(id, media_id, media_type).await? {
        return Err(AppError::NotFound(
            "Item not found in this watchlist".to_string(),
        ));
    }
    Ok(())
}

/// Chooses one item uniformly at random and loads its details
pub async fn random_pick(
    store: &dyn WatchlistStore,
    catalog: &dyn Catalog,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<RandomPick> {
    let items = list_items(store, id, user_id).await?;
    let chosen = picker::pick(&items).cloned().ok_or_else(|| {
        AppError::NotFound("This watchlist has no items to pick from".to_string())
    })?;

    let details = catalog
        .details(chosen.item.media_type, chosen.item.media_id)
        .await?;
    let config = catalog.configuration().await?;

    Ok(RandomPick::new(chosen, details, &config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::MockUserStore;
    use crate::db::watchlists::MockWatchlistStore;
    use crate::models::{CatalogConfig, Credits, MediaDetails, UserProfile, WatchlistMember};
    use crate::services::catalog::MockCatalog;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn watchlist(id: Uuid, owner_id: Uuid) -> Watchlist {
        Watchlist {
            id,
            owner_id,
            name: "Friday night".to_string(),
            description: Some("Films for the weekend".to_string()),
            invite_code: Some("a1b2c3d4".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(watchlist_id: Uuid, media_id: i64) -> ItemWithStatus {
        ItemWithStatus {
            item: WatchlistItem {
                id: Uuid::new_v4(),
                watchlist_id,
                media_id,
                media_type: MediaType::Movie,
                added_by: Uuid::new_v4(),
                added_at: Utc::now(),
            },
            favorite: false,
            watched: true,
        }
    }

    /// Store with one list owned by `owner` where `user` has `role`
    fn store_with(id: Uuid, owner: Uuid, user: Uuid, role: Option<MemberRole>) -> MockWatchlistStore {
        let mut store = MockWatchlistStore::new();
        store
            .expect_find()
            .with(eq(id))
            .returning(move |_| Ok(Some(watchlist(id, owner))));
        store
            .expect_member_role()
            .with(eq(id), eq(user))
            .returning(move |_, _| Ok(role));
        store
    }

    #[tokio::test]
    async fn test_create_trims_name_and_generates_invite_code() {
        let owner = Uuid::new_v4();
        let mut store = MockWatchlistStore::new();
        store
            .expect_create_with_owner()
            .withf(move |o, name, description, code| {
                *o == owner
                    && name == "Horror marathon"
                    && description.is_none()
                    && code.len() == 8
            })
            .times(1)
            .returning(|owner_id, name, description, code| {
                Ok(Watchlist {
                    id: Uuid::new_v4(),
                    owner_id,
                    name,
                    description,
                    invite_code: Some(code),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                })
            });

        let created = create(
            &store,
            owner,
            CreateWatchlistRequest {
                name: "  Horror marathon ".to_string(),
                description: Some("   ".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(created.name, "Horror marathon");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let mut store = MockWatchlistStore::new();
        store.expect_create_with_owner().never();

        let err = create(
            &store,
            Uuid::new_v4(),
            CreateWatchlistRequest {
                name: "   ".to_string(),
                description: None,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_get_requires_membership() {
        let (id, owner, stranger) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let store = store_with(id, owner, stranger, None);

        let err = get(&store, id, stranger).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_get_missing_watchlist_is_not_found() {
        let mut store = MockWatchlistStore::new();
        store.expect_find().returning(|_| Ok(None));

        let err = get(&store, Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_unspecified_fields() {
        let (id, owner) = (Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(id, owner, owner, Some(MemberRole::Owner));
        store
            .expect_update()
            .withf(move |i, name, description| {
                *i == id && name == "Renamed" && description.as_deref() == Some("Films for the weekend")
            })
            .times(1)
            .returning(move |_, name, description| {
                Ok(Watchlist {
                    name,
                    description,
                    ..watchlist(id, owner)
                })
            });

        let updated = update(
            &store,
            id,
            owner,
            UpdateWatchlistRequest {
                name: Some("Renamed".to_string()),
                description: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Renamed");
    }

    #[tokio::test]
    async fn test_editors_cannot_delete() {
        let (id, owner, editor) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(id, owner, editor, Some(MemberRole::Editor));
        store.expect_delete().never();

        let err = delete(&store, id, editor).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_join_missing_watchlist_is_not_found() {
        let mut store = MockWatchlistStore::new();
        store.expect_find().returning(|_| Ok(None));
        store.expect_add_member().never();

        let err = join(&store, Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_join_is_idempotent_for_members() {
        let (id, owner, member) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(id, owner, member, Some(MemberRole::Viewer));
        store.expect_add_member().never();

        let outcome = join(&store, id, member).await.unwrap();
        assert!(outcome.already_member);
        assert_eq!(outcome.role, MemberRole::Viewer);
    }

    #[tokio::test]
    async fn test_join_adds_editor() {
        let (id, owner, newcomer) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(id, owner, newcomer, None);
        store
            .expect_add_member()
            .with(eq(id), eq(newcomer), eq(MemberRole::Editor))
            .times(1)
            .returning(|watchlist_id, user_id, role| {
                Ok(WatchlistMember {
                    id: Uuid::new_v4(),
                    watchlist_id,
                    user_id,
                    role,
                    joined_at: Utc::now(),
                })
            });

        let outcome = join(&store, id, newcomer).await.unwrap();
        assert!(!outcome.already_member);
        assert_eq!(outcome.role, MemberRole::Editor);
    }

    #[tokio::test]
    async fn test_join_preview_names_owner() {
        let (id, owner, viewer) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let watchlists = store_with(id, owner, viewer, None);
        let mut users = MockUserStore::new();
        users.expect_find().with(eq(owner)).returning(move |_| {
            Ok(Some(UserProfile {
                id: owner,
                email: Some("sam@example.com".to_string()),
                name: None,
                avatar_url: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });

        let preview = join_preview(&watchlists, &users, id, viewer).await.unwrap();
        assert_eq!(preview.owner_name, "sam");
        assert_eq!(preview.name, "Friday night");
        assert!(!preview.already_member);
    }

    #[test]
    fn test_login_redirect_preserves_join_path() {
        let id = Uuid::parse_str("6f1c2a9e-8d4b-4a57-9a0e-1d2c3b4a5f60").unwrap();
        assert_eq!(
            login_redirect("/auth/login", id),
            "/auth/login?redirect=%2Fjoin%2F6f1c2a9e-8d4b-4a57-9a0e-1d2c3b4a5f60"
        );
        assert!(login_redirect("/auth?lang=es", id).starts_with("/auth?lang=es&redirect="));
    }

    #[tokio::test]
    async fn test_owner_cannot_leave() {
        let (id, owner) = (Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(id, owner, owner, Some(MemberRole::Owner));
        store.expect_remove_member().never();

        let err = leave(&store, id, owner).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_owner_role_cannot_be_assigned() {
        let (id, owner, member) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(id, owner, owner, Some(MemberRole::Owner));
        store.expect_set_member_role().never();

        let err = set_member_role(&store, id, owner, member, MemberRole::Owner)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_remove_unknown_member_is_not_found() {
        let (id, owner, member) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(id, owner, owner, Some(MemberRole::Owner));
        store.expect_remove_member().returning(|_, _| Ok(false));

        let err = remove_member(&store, id, owner, member).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_item_is_conflict_without_insert() {
        let (id, owner, editor) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(id, owner, editor, Some(MemberRole::Editor));
        store
            .expect_has_item()
            .with(eq(id), eq(550), eq(MediaType::Movie))
            .returning(|_, _, _| Ok(true));
        store.expect_add_item().never();

        let err = add_item(
            &store,
            id,
            editor,
            AddItemRequest {
                media_id: 550,
                media_type: MediaType::Movie,
            },
        )
        .await
        .unwrap_err();

        match err {
            AppError::Conflict(msg) => assert_eq!(msg, DUPLICATE_ITEM_MESSAGE),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_viewers_cannot_add_items() {
        let (id, owner, viewer) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(id, owner, viewer, Some(MemberRole::Viewer));
        store.expect_has_item().never();
        store.expect_add_item().never();

        let err = add_item(
            &store,
            id,
            viewer,
            AddItemRequest {
                media_id: 1396,
                media_type: MediaType::Tv,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_random_pick_on_empty_list_is_not_found() {
        let (id, owner) = (Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(id, owner, owner, Some(MemberRole::Owner));
        store.expect_items().returning(|_, _| Ok(vec![]));
        let mut catalog = MockCatalog::new();
        catalog.expect_details().never();

        let err = random_pick(&store, &catalog, id, owner).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_random_pick_returns_a_list_item() {
        let (id, owner) = (Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(id, owner, owner, Some(MemberRole::Owner));
        store
            .expect_items()
            .returning(move |_, _| Ok(vec![item(id, 550), item(id, 603), item(id, 680)]));

        let mut catalog = MockCatalog::new();
        catalog.expect_details().returning(|media_type, media_id| {
            Ok(MediaDetails {
                media_type,
                id: media_id,
                title: format!("Movie {media_id}"),
                poster_path: None,
                backdrop_path: None,
                overview: String::new(),
                release_date: Some("1999-10-15".to_string()),
                genres: vec![],
                vote_average: 8.43,
                credits: Credits::default(),
                videos: vec![],
            })
        });
        catalog
            .expect_configuration()
            .returning(|| Ok(CatalogConfig::default()));

        let picked = random_pick(&store, &catalog, id, owner).await.unwrap();

        assert!([550, 603, 680].contains(&picked.item.item.media_id));
        assert_eq!(picked.details.id, picked.item.item.media_id);
        assert_eq!(picked.year, "1999");
        assert_eq!(picked.rating, "8.4");
        assert_eq!(picked.poster_url, "/placeholder.svg");
    }
}
