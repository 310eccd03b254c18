use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{Bson, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoDeckCardDocument, MongoSessionDocument, doc_id, uuid_as_binary},
};
use crate::dao::{
    game_store::GameStore,
    models::{DeckCardEntity, SessionEntity},
    storage::StorageResult,
};

const SESSION_COLLECTION_NAME: &str = "sessions";
const CARD_COLLECTION_NAME: &str = "cards";

/// MongoDB-backed store holding the `sessions` and `cards` collections.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure the indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        // Active-session scans happen on every startup to re-arm timers.
        let sessions = database.collection::<mongodb::bson::Document>(SESSION_COLLECTION_NAME);
        let status_index = mongodb::IndexModel::builder()
            .keys(doc! {"status": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("session_status_idx".to_owned()))
                    .build(),
            )
            .build();
        sessions
            .create_index(status_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SESSION_COLLECTION_NAME,
                index: "status",
                source,
            })?;

        // Every deck draw filters on is_active.
        let cards = database.collection::<mongodb::bson::Document>(CARD_COLLECTION_NAME);
        let active_index = mongodb::IndexModel::builder()
            .keys(doc! {"is_active": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("card_active_idx".to_owned()))
                    .build(),
            )
            .build();
        cards
            .create_index(active_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: CARD_COLLECTION_NAME,
                index: "is_active",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn session_collection(&self) -> Collection<MongoSessionDocument> {
        self.database()
            .await
            .collection::<MongoSessionDocument>(SESSION_COLLECTION_NAME)
    }

    async fn card_collection(&self) -> Collection<MongoDeckCardDocument> {
        self.database()
            .await
            .collection::<MongoDeckCardDocument>(CARD_COLLECTION_NAME)
    }

    async fn save_session(&self, session: SessionEntity) -> MongoResult<()> {
        let id = session.id;
        let document: MongoSessionDocument = session.into();
        let collection = self.session_collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveSession { id, source })?;
        Ok(())
    }

    async fn find_session(&self, id: Uuid) -> MongoResult<Option<SessionEntity>> {
        let collection = self.session_collection().await;
        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadSession { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn list_active_sessions(&self) -> MongoResult<Vec<SessionEntity>> {
        let collection = self.session_collection().await;
        let documents: Vec<MongoSessionDocument> = collection
            .find(doc! {"status": "active"})
            .await
            .map_err(|source| MongoDaoError::ListSessions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListSessions { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn save_card(&self, card: DeckCardEntity) -> MongoResult<()> {
        let id = card.id;
        let document: MongoDeckCardDocument = card.into();
        let collection = self.card_collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveCard { id, source })?;
        Ok(())
    }

    async fn find_card(&self, id: Uuid) -> MongoResult<Option<DeckCardEntity>> {
        let collection = self.card_collection().await;
        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadCard { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn list_candidate_cards(
        &self,
        exclude: Vec<Uuid>,
        limit: usize,
    ) -> MongoResult<Vec<DeckCardEntity>> {
        let excluded: Vec<Bson> = exclude
            .into_iter()
            .map(|id| Bson::Binary(uuid_as_binary(id)))
            .collect();

        let collection = self.card_collection().await;
        let documents: Vec<MongoDeckCardDocument> = collection
            .find(doc! {"is_active": true, "_id": {"$nin": excluded}})
            .limit(limit as i64)
            .await
            .map_err(|source| MongoDaoError::ListCandidates { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListCandidates { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }
}

impl GameStore for MongoGameStore {
    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_session(session).await.map_err(Into::into) })
    }

    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_session(id).await.map_err(Into::into) })
    }

    fn list_active_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_active_sessions().await.map_err(Into::into) })
    }

    fn save_card(&self, card: DeckCardEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_card(card).await.map_err(Into::into) })
    }

    fn find_card(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<DeckCardEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_card(id).await.map_err(Into::into) })
    }

    fn list_candidate_cards(
        &self,
        exclude: Vec<Uuid>,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<DeckCardEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_candidate_cards(exclude, limit)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
