/// HTTP server for the pricing quotation API.
///
/// Routes (all under `/api`):
/// - `GET /`: service banner
/// - `POST /upload-pdf`: replace the pricing table from an uploaded document
/// - `POST /quotation`: best quotation for one item name
/// - `POST /search`: ranked candidates for a batch of keywords
/// - `GET /items`, `GET /items-count`: inspect the stored table
/// - `GET|POST /favorites`, `DELETE /favorites/{product_name}`: favorite marks
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::extract::multipart::MultipartError;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::info;

use pricing_common::api::{
    CountResponse, FavoriteRequest, FavoriteResponse, FavoritesResponse, ItemsQuery,
    MessageResponse, QuotationRequest, QuotationResponse, SearchRequest, SearchResponse,
    UploadResponse,
};
use pricing_common::model::PricingRecord;
use pricing_common::store::PricingStore;

use crate::config::ANY_ORIGIN;
use crate::error::AppError;
use crate::ingest::IngestService;
use crate::search::QuoteService;

const BANNER: &str = "PDF Pricing Quotation API";
const UPLOAD_FIELD: &str = "file";

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PricingStore>,
    pub quotes: Arc<QuoteService>,
    pub ingest: Arc<IngestService>,
    pub items_default_limit: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PricingStore>,
        quotes: QuoteService,
        items_default_limit: usize,
    ) -> Self {
        Self {
            ingest: Arc::new(IngestService::new(Arc::clone(&store))),
            quotes: Arc::new(quotes),
            store,
            items_default_limit,
        }
    }
}

/// CORS policy for browser clients.
///
/// Credentials are allowed and request methods and headers are mirrored. `*` mirrors
/// the request origin, so any origin is accepted.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, AppError> {
    let allow_origin = if origins.iter().any(|origin| origin == ANY_ORIGIN) {
        AllowOrigin::mirror_request()
    } else {
        let values = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|e| {
                    AppError::Config(format!("CORS_ORIGINS entry '{origin}' is invalid: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

pub fn router(state: AppState, max_upload_bytes: usize, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api", get(root))
        .route("/api/", get(root))
        .route("/api/upload-pdf", post(upload_pdf))
        .route("/api/quotation", post(quotation))
        .route("/api/search", post(search))
        .route("/api/items", get(list_items))
        .route("/api/items-count", get(items_count))
        .route("/api/favorites", get(list_favorites).post(add_favorite))
        .route("/api/favorites/{product_name}", delete(remove_favorite))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: BANNER.to_string(),
    })
}

async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(upload_error)?;

        let result = state.ingest.ingest(&file_name, bytes.to_vec()).await?;
        info!(
            file_name = %file_name,
            digest = %result.digest,
            pages = result.page_count,
            items_count = result.items_count,
            "upload processed"
        );
        return Ok(Json(UploadResponse {
            message: "PDF processed successfully".to_string(),
            items_count: result.items_count,
        }));
    }

    Err(AppError::Upload(format!("missing multipart field '{UPLOAD_FIELD}'")))
}

fn upload_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UploadTooLarge(e.body_text())
    } else {
        AppError::Upload(e.body_text())
    }
}

async fn quotation(
    State(state): State<AppState>,
    Json(request): Json<QuotationRequest>,
) -> Result<Json<QuotationResponse>, AppError> {
    let quote = state.quotes.quote(&request.item_name).await?;
    info!(
        item_name = %request.item_name,
        matched = %quote.item_name,
        score = quote.score,
        source = %quote.source,
        "quotation served"
    );
    Ok(Json(quote))
}

async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let results = state.quotes.search(&request.keywords, request.limit).await?;
    Ok(Json(SearchResponse { results }))
}

async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemsQuery>,
) -> Result<Json<Vec<PricingRecord>>, AppError> {
    let limit = query.limit.unwrap_or(state.items_default_limit);
    let mut records = state.store.fetch_all_records().await?;
    records.truncate(limit);
    Ok(Json(records))
}

async fn items_count(State(state): State<AppState>) -> Result<Json<CountResponse>, AppError> {
    let count = state.store.count_records().await?;
    Ok(Json(CountResponse { count }))
}

async fn list_favorites(
    State(state): State<AppState>,
) -> Result<Json<FavoritesResponse>, AppError> {
    let mut favorites: Vec<String> = state
        .store
        .fetch_favorite_names()
        .await?
        .into_iter()
        .collect();
    favorites.sort();
    Ok(Json(FavoritesResponse { favorites }))
}

async fn add_favorite(
    State(state): State<AppState>,
    Json(request): Json<FavoriteRequest>,
) -> Result<Json<FavoriteResponse>, AppError> {
    if request.product_name.trim().is_empty() {
        return Err(AppError::EmptyQuery("product_name"));
    }
    let added = state.store.add_favorite(&request.product_name).await?;
    info!(product_name = %request.product_name, added, "favorite marked");
    Ok(Json(FavoriteResponse {
        product_name: request.product_name,
        favorite: true,
    }))
}

async fn remove_favorite(
    State(state): State<AppState>,
    Path(product_name): Path<String>,
) -> Result<Json<FavoriteResponse>, AppError> {
    let removed = state.store.remove_favorite(&product_name).await?;
    info!(product_name = %product_name, removed, "favorite cleared");
    Ok(Json(FavoriteResponse {
        product_name,
        favorite: false,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use axum::response::{IntoResponse, Response};
    use tower::ServiceExt;
    use pricing_common::model::QuotationSource;
    use pricing_common::store::MemoryStore;

    use crate::matcher::tests::record;
    use crate::matcher::MatchOptions;

    async fn state_with(records: Vec<PricingRecord>) -> AppState {
        let store: Arc<dyn PricingStore> = Arc::new(MemoryStore::new());
        store.replace_all_records(records).await.unwrap();
        let quotes = QuoteService::new(Arc::clone(&store), MatchOptions::default());
        AppState::new(store, quotes, 2)
    }

    fn priced(name: &str, five_percent: &str) -> PricingRecord {
        PricingRecord {
            five_percent: five_percent.to_string(),
            ..record(name)
        }
    }

    #[tokio::test]
    async fn root_reports_banner() {
        let Json(body) = root().await;
        assert_eq!(body.message, "PDF Pricing Quotation API");
    }

    #[tokio::test]
    async fn quotation_returns_match() {
        let state = state_with(vec![priced("Cimento CP II", "R$ 30,87")]).await;
        let Json(quote) = quotation(
            State(state),
            Json(QuotationRequest {
                item_name: "cimento".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(quote.item_name, "Cimento CP II");
        assert_eq!(quote.quotation_value, "R$ 30,87");
        assert_eq!(quote.source, QuotationSource::FivePercent);
    }

    #[tokio::test]
    async fn empty_query_is_400_and_unknown_item_is_404() {
        let state = state_with(vec![priced("Cimento CP II", "")]).await;

        let err = quotation(
            State(state.clone()),
            Json(QuotationRequest {
                item_name: "  ".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = quotation(
            State(state),
            Json(QuotationRequest {
                item_name: "zzzz".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn items_respect_default_and_explicit_limit() {
        let state = state_with(vec![record("A"), record("B"), record("C")]).await;

        let Json(items) = list_items(State(state.clone()), Query(ItemsQuery { limit: None }))
            .await
            .unwrap();
        assert_eq!(items.len(), 2);

        let Json(items) = list_items(State(state.clone()), Query(ItemsQuery { limit: Some(10) }))
            .await
            .unwrap();
        assert_eq!(items.len(), 3);

        let Json(count) = items_count(State(state)).await.unwrap();
        assert_eq!(count.count, 3);
    }

    #[tokio::test]
    async fn favorites_round_trip_through_handlers() {
        let state = state_with(Vec::new()).await;
        for name in ["Brita 1", "Areia", "Brita 1"] {
            let Json(resp) = add_favorite(
                State(state.clone()),
                Json(FavoriteRequest {
                    product_name: name.to_string(),
                }),
            )
            .await
            .unwrap();
            assert!(resp.favorite);
        }

        let Json(list) = list_favorites(State(state.clone())).await.unwrap();
        assert_eq!(list.favorites, vec!["Areia", "Brita 1"]);

        let Json(resp) = remove_favorite(State(state.clone()), Path("Areia".to_string()))
            .await
            .unwrap();
        assert!(!resp.favorite);
        let Json(list) = list_favorites(State(state)).await.unwrap();
        assert_eq!(list.favorites, vec!["Brita 1"]);
    }

    #[tokio::test]
    async fn search_returns_one_entry_per_keyword() {
        let state = state_with(vec![priced("Areia media", ""), priced("Brita 1", "")]).await;
        let Json(resp) = search(
            State(state),
            Json(SearchRequest {
                keywords: vec!["brita".to_string(), "areia".to_string()],
                limit: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.results.len(), 2);
        assert_eq!(resp.results[0].results[0].product_name, "Brita 1");
        assert_eq!(resp.results[1].results[0].product_name, "Areia media");
    }

    async fn cors_response(origins: &[&str], request: Request<Body>) -> Response {
        let origins: Vec<String> = origins.iter().map(|o| o.to_string()).collect();
        let app = router(
            state_with(Vec::new()).await,
            1024,
            cors_layer(&origins).unwrap(),
        );
        app.oneshot(request).await.unwrap()
    }

    fn allowed_origin(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn cors_accepts_listed_origin_with_credentials() {
        let request = Request::get("/api/")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = cors_response(&["http://localhost:3000"], request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(allowed_origin(&response), Some("http://localhost:3000"));
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            Some(&HeaderValue::from_static("true"))
        );

        let request = Request::get("/api/")
            .header(header::ORIGIN, "http://elsewhere.example")
            .body(Body::empty())
            .unwrap();
        let response = cors_response(&["http://localhost:3000"], request).await;
        assert_eq!(allowed_origin(&response), None);
    }

    #[tokio::test]
    async fn cors_wildcard_answers_preflight_for_any_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/search")
            .header(header::ORIGIN, "http://app.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let response = cors_response(&["*"], request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(allowed_origin(&response), Some("http://app.example"));
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_METHODS),
            Some(&HeaderValue::from_static("POST"))
        );
    }

    #[test]
    fn malformed_cors_origin_is_config_error() {
        assert!(matches!(
            cors_layer(&["http://bad\norigin".to_string()]),
            Err(AppError::Config(_))
        ));
    }
}
