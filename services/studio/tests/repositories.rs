//! Repository behaviour against a migrated in-memory SQLite database.

mod common;

use common::{seed_chapter, seed_character, seed_novel, store};
use novel_assistant_core::domain::{
    ChapterQuery, ChapterUpdate, CharacterStatus, CharacterUpdate, NewChapter, NewCharacter,
    NewRelationship, NovelUpdate, RelationshipUpdate, AUTO_SAVE_COMMENT, INITIAL_VERSION_COMMENT,
};
use novel_assistant_core::ports::{PortError, Repositories};

async fn relate(repos: &Repositories, novel_id: i64, a: i64, b: i64, kind: &str) -> i64 {
    repos
        .relationships
        .create(NewRelationship {
            novel_id,
            character1_id: a,
            character2_id: b,
            relationship_type: kind.to_string(),
            description: String::new(),
            start_chapter: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn content_update_keeps_prior_content_as_version() {
    let store = store().await;
    let repos = store.repositories();
    let novel = seed_novel(&repos, "测试小说", "O").await;
    let created = repos
        .chapters
        .create(NewChapter {
            novel_id: novel.id,
            chapter_number: 1,
            title: "T".to_string(),
            content: "C1".to_string(),
            ..NewChapter::default()
        })
        .await
        .unwrap();

    repos
        .chapters
        .update(
            created.id,
            ChapterUpdate {
                content: Some("C2".to_string()),
                ..ChapterUpdate::default()
            },
        )
        .await
        .unwrap();

    let versions = repos.chapters.versions(created.id).await.unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].comment, AUTO_SAVE_COMMENT);
    assert_eq!(versions[0].content, "C1");
    assert_eq!(versions[1].comment, INITIAL_VERSION_COMMENT);
    assert_eq!(versions[1].content, "C1");
    assert_eq!(repos.chapters.get(created.id).await.unwrap().content, "C2");
}

#[tokio::test]
async fn restoring_a_version_versions_the_replaced_content() {
    let store = store().await;
    let repos = store.repositories();
    let novel = seed_novel(&repos, "回溯", "").await;
    let ch = seed_chapter(&repos, novel.id, 1, "C1").await;
    repos
        .chapters
        .update(
            ch.id,
            ChapterUpdate {
                content: Some("C2".to_string()),
                ..ChapterUpdate::default()
            },
        )
        .await
        .unwrap();

    let initial = repos
        .chapters
        .versions(ch.id)
        .await
        .unwrap()
        .into_iter()
        .find(|v| v.comment == INITIAL_VERSION_COMMENT)
        .unwrap();
    let restored = repos.chapters.restore_version(initial.id).await.unwrap();
    assert_eq!(restored.content, "C1");

    let versions = repos.chapters.versions(ch.id).await.unwrap();
    assert_eq!(versions.len(), 3);
    assert_eq!(versions[0].content, "C2");

    assert!(matches!(
        repos.chapters.restore_version(9999).await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn summary_and_title_updates_are_not_versioned() {
    let store = store().await;
    let repos = store.repositories();
    let novel = seed_novel(&repos, "摘要", "").await;
    let ch = seed_chapter(&repos, novel.id, 1, "正文").await;

    let updated = repos
        .chapters
        .update(
            ch.id,
            ChapterUpdate {
                summary: Some("S".to_string()),
                title: Some("新标题".to_string()),
                ..ChapterUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.summary, "S");
    assert!(updated.updated_at >= ch.updated_at);
    assert_eq!(repos.chapters.versions(ch.id).await.unwrap().len(), 1);

    let unchanged = repos
        .chapters
        .update(ch.id, ChapterUpdate::default())
        .await
        .unwrap();
    assert_eq!(unchanged, updated);
}

#[tokio::test]
async fn deleting_a_novel_removes_everything_it_owns() {
    let store = store().await;
    let repos = store.repositories();
    let doomed = seed_novel(&repos, "将删", "").await;
    let kept = seed_novel(&repos, "保留", "").await;

    let ch = seed_chapter(&repos, doomed.id, 1, "内容").await;
    repos
        .chapters
        .update(
            ch.id,
            ChapterUpdate {
                content: Some("新内容".to_string()),
                ..ChapterUpdate::default()
            },
        )
        .await
        .unwrap();
    let a = seed_character(&repos, doomed.id, "甲").await;
    let b = seed_character(&repos, doomed.id, "乙").await;
    relate(&repos, doomed.id, a.id, b.id, "朋友").await;
    seed_chapter(&repos, kept.id, 1, "别的").await;

    repos.novels.delete(doomed.id).await.unwrap();

    assert!(matches!(
        repos.novels.get(doomed.id).await,
        Err(PortError::NotFound(_))
    ));
    for table in ["characters", "character_relationships"] {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 0, "{} should be empty", table);
    }
    let versions: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM chapter_versions WHERE chapter_id = ?",
    )
    .bind(ch.id)
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(versions, 0);
    assert!(repos
        .chapters
        .list_by_novel(doomed.id, ChapterQuery::default())
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        repos
            .chapters
            .list_by_novel(kept.id, ChapterQuery::default())
            .await
            .unwrap()
            .len(),
        1
    );

    assert!(matches!(
        repos.novels.delete(doomed.id).await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_an_endpoint_drops_the_relationship() {
    let store = store().await;
    let repos = store.repositories();
    let novel = seed_novel(&repos, "关系", "").await;
    let a = seed_character(&repos, novel.id, "甲").await;
    let b = seed_character(&repos, novel.id, "乙").await;
    let c = seed_character(&repos, novel.id, "丙").await;
    relate(&repos, novel.id, a.id, b.id, "朋友").await;
    relate(&repos, novel.id, c.id, a.id, "敌人").await;

    repos.characters.delete(b.id).await.unwrap();
    let of_a = repos.relationships.list_for_character(a.id).await.unwrap();
    assert_eq!(of_a.len(), 1);
    assert_eq!(of_a[0].other_name, "丙");

    repos.characters.delete(a.id).await.unwrap();
    assert!(repos
        .relationships
        .list_for_character(c.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn relationships_are_listed_from_the_queried_character() {
    let store = store().await;
    let repos = store.repositories();
    let novel = seed_novel(&repos, "视角", "").await;
    let master = seed_character(&repos, novel.id, "师父").await;
    let pupil = seed_character(&repos, novel.id, "徒弟").await;
    relate(&repos, novel.id, master.id, pupil.id, "师傅").await;

    let from_pupil = repos.relationships.list_for_character(pupil.id).await.unwrap();
    assert_eq!(from_pupil.len(), 1);
    assert_eq!(from_pupil[0].self_id, pupil.id);
    assert_eq!(from_pupil[0].self_name, "徒弟");
    assert_eq!(from_pupil[0].other_id, master.id);
    assert_eq!(from_pupil[0].other_name, "师父");

    let from_master = repos.relationships.list_for_character(master.id).await.unwrap();
    assert_eq!(from_master[0].self_name, "师父");
    assert_eq!(from_master[0].other_name, "徒弟");

    assert!(matches!(
        repos.relationships.list_for_character(9999).await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn relationship_endpoints_are_validated() {
    let store = store().await;
    let repos = store.repositories();
    let first = seed_novel(&repos, "一", "").await;
    let second = seed_novel(&repos, "二", "").await;
    let a = seed_character(&repos, first.id, "甲").await;
    let b = seed_character(&repos, first.id, "乙").await;
    let outsider = seed_character(&repos, second.id, "外人").await;
    let foreign_chapter = seed_chapter(&repos, second.id, 1, "").await;

    let attempt = |c1: i64, c2: i64, start_chapter: Option<i64>| NewRelationship {
        novel_id: first.id,
        character1_id: c1,
        character2_id: c2,
        relationship_type: "朋友".to_string(),
        description: String::new(),
        start_chapter,
    };

    assert!(matches!(
        repos.relationships.create(attempt(a.id, a.id, None)).await,
        Err(PortError::ConstraintViolation(_))
    ));
    assert!(matches!(
        repos.relationships.create(attempt(a.id, outsider.id, None)).await,
        Err(PortError::ConstraintViolation(_))
    ));
    assert!(matches!(
        repos.relationships.create(attempt(a.id, 9999, None)).await,
        Err(PortError::NotFound(_))
    ));
    assert!(matches!(
        repos
            .relationships
            .create(attempt(a.id, b.id, Some(foreign_chapter.id)))
            .await,
        Err(PortError::ConstraintViolation(_))
    ));
    assert!(repos.relationships.create(attempt(a.id, b.id, None)).await.is_ok());
}

#[tokio::test]
async fn relationship_update_and_novel_listing() {
    let store = store().await;
    let repos = store.repositories();
    let novel = seed_novel(&repos, "变化", "").await;
    let ch = seed_chapter(&repos, novel.id, 3, "").await;
    let a = seed_character(&repos, novel.id, "甲").await;
    let b = seed_character(&repos, novel.id, "乙").await;
    let id = relate(&repos, novel.id, a.id, b.id, "朋友").await;

    let updated = repos
        .relationships
        .update(
            id,
            RelationshipUpdate {
                relationship_type: Some("恋人".to_string()),
                start_chapter: Some(Some(ch.id)),
                ..RelationshipUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.relationship_type, "恋人");
    assert_eq!(updated.start_chapter, Some(ch.id));

    let listed = repos.relationships.list_by_novel(novel.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].character1_name, "甲");
    assert_eq!(listed[0].character2_name, "乙");
    assert_eq!(listed[0].start_chapter_number, Some(3));

    repos.relationships.delete(id).await.unwrap();
    assert!(matches!(
        repos.relationships.delete(id).await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_a_chapter_clears_references_to_it() {
    let store = store().await;
    let repos = store.repositories();
    let novel = seed_novel(&repos, "引用", "").await;
    let ch = seed_chapter(&repos, novel.id, 1, "正文").await;
    let a = repos
        .characters
        .create(NewCharacter {
            novel_id: novel.id,
            name: "甲".to_string(),
            first_appearance: Some(ch.id),
            ..NewCharacter::default()
        })
        .await
        .unwrap();
    let b = seed_character(&repos, novel.id, "乙").await;
    let rel = repos
        .relationships
        .create(NewRelationship {
            novel_id: novel.id,
            character1_id: a.id,
            character2_id: b.id,
            relationship_type: "同事".to_string(),
            description: String::new(),
            start_chapter: Some(ch.id),
        })
        .await
        .unwrap();

    repos.chapters.delete(ch.id).await.unwrap();

    assert_eq!(repos.characters.get(a.id).await.unwrap().first_appearance, None);
    assert_eq!(repos.relationships.get(rel.id).await.unwrap().start_chapter, None);
    assert!(matches!(
        repos.chapters.versions(ch.id).await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn uniqueness_constraints_are_enforced() {
    let store = store().await;
    let repos = store.repositories();
    let first = seed_novel(&repos, "唯一", "").await;
    let second = seed_novel(&repos, "另一", "").await;

    assert!(matches!(
        repos
            .novels
            .create(novel_assistant_core::domain::NewNovel {
                title: "唯一".to_string(),
                outline: String::new(),
            })
            .await,
        Err(PortError::ConstraintViolation(_))
    ));
    assert!(matches!(
        repos
            .novels
            .update(
                second.id,
                NovelUpdate {
                    title: Some("唯一".to_string()),
                    ..NovelUpdate::default()
                }
            )
            .await,
        Err(PortError::ConstraintViolation(_))
    ));

    seed_chapter(&repos, first.id, 1, "").await;
    for number in [1, 0] {
        assert!(matches!(
            repos
                .chapters
                .create(NewChapter {
                    novel_id: first.id,
                    chapter_number: number,
                    title: "重复".to_string(),
                    ..NewChapter::default()
                })
                .await,
            Err(PortError::ConstraintViolation(_))
        ));
    }
    assert!(matches!(
        repos
            .chapters
            .create(NewChapter {
                novel_id: 9999,
                chapter_number: 1,
                ..NewChapter::default()
            })
            .await,
        Err(PortError::NotFound(_))
    ));

    let hero = seed_character(&repos, first.id, "林远").await;
    let rival = seed_character(&repos, first.id, "苏晴").await;
    assert!(matches!(
        repos
            .characters
            .create(NewCharacter {
                novel_id: first.id,
                name: "林远".to_string(),
                ..NewCharacter::default()
            })
            .await,
        Err(PortError::ConstraintViolation(_))
    ));
    assert!(matches!(
        repos
            .characters
            .update(
                rival.id,
                CharacterUpdate {
                    name: Some("林远".to_string()),
                    ..CharacterUpdate::default()
                }
            )
            .await,
        Err(PortError::ConstraintViolation(_))
    ));
    // The same name is fine in another novel, and a character may keep its own name.
    seed_character(&repos, second.id, "林远").await;
    assert!(repos
        .characters
        .update(
            hero.id,
            CharacterUpdate {
                name: Some("林远".to_string()),
                ..CharacterUpdate::default()
            }
        )
        .await
        .is_ok());
}

#[tokio::test]
async fn character_fields_update_freely() {
    let store = store().await;
    let repos = store.repositories();
    let home = seed_novel(&repos, "人物", "").await;
    let elsewhere = seed_novel(&repos, "别处", "").await;
    let ch = seed_chapter(&repos, home.id, 1, "").await;
    let foreign = seed_chapter(&repos, elsewhere.id, 1, "").await;
    let hero = seed_character(&repos, home.id, "林远").await;
    assert_eq!(hero.status, CharacterStatus::Active);

    let dead = repos
        .characters
        .update(
            hero.id,
            CharacterUpdate {
                status: Some(CharacterStatus::Deceased),
                first_appearance: Some(Some(ch.id)),
                ..CharacterUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(dead.status, CharacterStatus::Deceased);
    assert_eq!(dead.first_appearance, Some(ch.id));

    let revived = repos
        .characters
        .update(
            hero.id,
            CharacterUpdate {
                status: Some(CharacterStatus::Active),
                first_appearance: Some(None),
                ..CharacterUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(revived.status, CharacterStatus::Active);
    assert_eq!(revived.first_appearance, None);

    assert!(matches!(
        repos
            .characters
            .update(
                hero.id,
                CharacterUpdate {
                    first_appearance: Some(Some(foreign.id)),
                    ..CharacterUpdate::default()
                }
            )
            .await,
        Err(PortError::ConstraintViolation(_))
    ));
    assert_eq!(
        repos.characters.find_by_name(home.id, "林远").await.unwrap().map(|c| c.id),
        Some(hero.id)
    );
    assert!(repos.characters.find_by_name(home.id, "无名").await.unwrap().is_none());
}

#[tokio::test]
async fn chapter_listing_honours_cut_off_and_limit() {
    let store = store().await;
    let repos = store.repositories();
    let novel = seed_novel(&repos, "列表", "").await;
    assert_eq!(repos.chapters.next_chapter_number(novel.id).await.unwrap(), 1);
    for number in [3, 1, 4, 2, 5] {
        seed_chapter(&repos, novel.id, number, "").await;
    }
    assert_eq!(repos.chapters.next_chapter_number(novel.id).await.unwrap(), 6);

    let numbers = |chapters: Vec<novel_assistant_core::domain::Chapter>| {
        chapters.into_iter().map(|c| c.chapter_number).collect::<Vec<_>>()
    };

    let all = repos
        .chapters
        .list_by_novel(novel.id, ChapterQuery::default())
        .await
        .unwrap();
    assert_eq!(numbers(all), vec![1, 2, 3, 4, 5]);

    let before = repos
        .chapters
        .list_by_novel(
            novel.id,
            ChapterQuery {
                before_chapter: Some(4),
                limit: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(numbers(before), vec![1, 2, 3]);

    let nearest = repos
        .chapters
        .list_by_novel(
            novel.id,
            ChapterQuery {
                before_chapter: Some(5),
                limit: Some(2),
            },
        )
        .await
        .unwrap();
    assert_eq!(numbers(nearest), vec![3, 4]);

    let found = repos.chapters.find_by_number(novel.id, 4).await.unwrap();
    assert_eq!(found.map(|c| c.chapter_number), Some(4));
    assert!(repos.chapters.find_by_number(novel.id, 9).await.unwrap().is_none());
}

#[tokio::test]
async fn catalog_is_seeded_in_category_order() {
    let store = store().await;
    let repos = store.repositories();

    let catalog = repos.relationships.relationship_types().await.unwrap();
    assert_eq!(catalog.len(), 17);
    assert_eq!(catalog[0].category, "家族");
    assert_eq!(catalog[0].type_name, "父子");
    assert_eq!(catalog[16].category, "职场");
    assert_eq!(catalog[16].type_name, "同事");

    // Re-running the migrations must not duplicate the seed rows.
    store.run_migrations().await.unwrap();
    assert_eq!(repos.relationships.relationship_types().await.unwrap().len(), 17);
}

#[tokio::test]
async fn novels_are_listed_newest_first() {
    let store = store().await;
    let repos = store.repositories();
    let older = seed_novel(&repos, "旧作", "").await;
    let newer = seed_novel(&repos, "新作", "").await;

    let ids: Vec<i64> = repos
        .novels
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(ids, vec![newer.id, older.id]);
    assert_eq!(
        repos.novels.find_by_title("旧作").await.unwrap().map(|n| n.id),
        Some(older.id)
    );
    assert!(matches!(
        repos
            .novels
            .update(
                older.id,
                NovelUpdate {
                    current_chapter: Some(0),
                    ..NovelUpdate::default()
                }
            )
            .await,
        Err(PortError::ConstraintViolation(_))
    ));
}
