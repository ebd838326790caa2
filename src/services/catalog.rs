//! Catalog service
//!
//! Read-side composition of storefront pages. Each page issues its backend
//! reads concurrently and resolves brand/importer references against the
//! fetched collections.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{
    active_in_order, BlogFilter, BlogPost, Brand, Car, CarFilter, CarType, EntityId, Envelope,
    HeroSlide, Identified, Importer, Reference,
};
use crate::services::backend::{BackendClient, BackendError, RequestConfig};
use crate::services::forms::Resource;

/// Number of vehicles featured on the home page
const HOME_CARS: usize = 8;
/// Number of blog posts featured on the home page
const HOME_POSTS: usize = 3;

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub slides: Vec<HeroSlide>,
    pub brands: Vec<Brand>,
    pub cars: Vec<Car>,
    pub posts: Vec<BlogPost>,
}

#[derive(Debug, Serialize)]
pub struct CarListing {
    pub cars: Vec<Car>,
    pub brands: Vec<Brand>,
    pub types: Vec<CarType>,
}

#[derive(Debug, Serialize)]
pub struct CarDetail {
    pub car: Car,
    pub brands: Vec<Brand>,
    pub importer: Option<Importer>,
}

#[derive(Debug, Serialize)]
pub struct BrandDetail {
    pub brand: Brand,
    pub cars: Vec<Car>,
    pub importers: Vec<Importer>,
}

#[derive(Debug, Serialize)]
pub struct ImporterDetail {
    pub importer: Importer,
    pub brands: Vec<Brand>,
    pub cars: Vec<Car>,
}

/// Record counts shown on the back-office dashboard
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct DashboardCounts {
    pub cars: usize,
    pub brands: usize,
    pub importers: usize,
    pub posts: usize,
    pub slides: usize,
}

/// Storefront read model over the backend
#[derive(Debug, Clone)]
pub struct CatalogService {
    client: BackendClient,
}

impl CatalogService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Fetch a collection, decoding record by record. Records that do not
    /// decode are logged and skipped.
    async fn list<T: DeserializeOwned>(&self, resource: Resource, config: &RequestConfig) -> Result<Vec<T>, BackendError> {
        let items: Envelope<Vec<serde_json::Value>> = self.client.get(resource.path(), config).await?;
        Ok(decode_records(resource, items.into_inner()))
    }

    async fn one<T: DeserializeOwned>(&self, resource: Resource, id: &str) -> Result<T, BackendError> {
        let item: Envelope<T> = self.client.get(&resource.item_path(id), &RequestConfig::new()).await?;
        Ok(item.into_inner())
    }

    pub async fn cars(&self) -> Result<Vec<Car>, BackendError> {
        self.list(Resource::Cars, &RequestConfig::new()).await
    }

    pub async fn brands(&self) -> Result<Vec<Brand>, BackendError> {
        self.list(Resource::Brands, &RequestConfig::new()).await
    }

    pub async fn importers(&self) -> Result<Vec<Importer>, BackendError> {
        self.list(Resource::Importers, &RequestConfig::new()).await
    }

    /// All posts, drafts included. Posts without a slug are linked by id.
    pub async fn posts(&self) -> Result<Vec<BlogPost>, BackendError> {
        let posts: Vec<BlogPost> = self.list(Resource::Blog, &RequestConfig::new()).await?;
        Ok(posts.into_iter().map(with_slug).collect())
    }

    pub async fn slides(&self) -> Result<Vec<HeroSlide>, BackendError> {
        self.list(Resource::HeroSlides, &RequestConfig::new()).await
    }

    /// Slides fetched with the caller's credentials, inactive ones included
    pub async fn slides_with(&self, config: &RequestConfig) -> Result<Vec<HeroSlide>, BackendError> {
        self.list(Resource::HeroSlides, config).await
    }

    pub async fn home(&self) -> Result<HomePage, BackendError> {
        let (slides, brands, mut cars, posts) =
            tokio::try_join!(self.slides(), self.brands(), self.cars(), self.posts())?;

        newest_first(&mut cars, |c| c.created_at);
        cars.truncate(HOME_CARS);

        let mut posts: Vec<BlogPost> = posts.into_iter().filter(|p| p.published).collect();
        newest_first(&mut posts, |p| p.created_at);
        posts.truncate(HOME_POSTS);

        Ok(HomePage {
            slides: active_in_order(slides),
            brands,
            cars,
            posts,
        })
    }

    pub async fn car_listing(&self, filter: &CarFilter) -> Result<CarListing, BackendError> {
        let (cars, brands) = tokio::try_join!(self.cars(), self.brands())?;
        let mut cars: Vec<Car> = cars.into_iter().filter(|c| filter.matches(c)).collect();
        newest_first(&mut cars, |c| c.created_at);

        Ok(CarListing {
            cars,
            brands,
            types: CarType::ALL.to_vec(),
        })
    }

    pub async fn car_detail(&self, id: &str) -> Result<CarDetail, BackendError> {
        let (car, brands, importers) =
            tokio::try_join!(self.one::<Car>(Resource::Cars, id), self.brands(), self.importers())?;

        let brands = resolve(car.brand.iter().chain(car.brands.iter()), &brands);
        let importer = resolve(car.importer.iter(), &importers).into_iter().next();

        Ok(CarDetail { car, brands, importer })
    }

    pub async fn brand_detail(&self, id: &str) -> Result<BrandDetail, BackendError> {
        let (brand, cars, importers) =
            tokio::try_join!(self.one::<Brand>(Resource::Brands, id), self.cars(), self.importers())?;

        let brand_id = brand.id.as_str();
        let cars = cars.into_iter().filter(|c| c.has_brand(brand_id)).collect();
        let importers = importers.into_iter().filter(|i| i.carries_brand(brand_id)).collect();

        Ok(BrandDetail { brand, cars, importers })
    }

    pub async fn importer_detail(&self, id: &str) -> Result<ImporterDetail, BackendError> {
        let (importer, brands, cars) =
            tokio::try_join!(self.one::<Importer>(Resource::Importers, id), self.brands(), self.cars())?;

        let brands = resolve(importer.brands.iter(), &brands);
        let cars = cars
            .into_iter()
            .filter(|c| c.importer_id() == Some(&importer.id))
            .collect();

        Ok(ImporterDetail { importer, brands, cars })
    }

    /// Published posts matching the filter, newest first
    pub async fn blog(&self, filter: &BlogFilter) -> Result<Vec<BlogPost>, BackendError> {
        let mut posts: Vec<BlogPost> = self.posts().await?.into_iter().filter(|p| filter.matches(p)).collect();
        newest_first(&mut posts, |p| p.created_at);
        Ok(posts)
    }

    /// A published post by slug. Drafts are reported as missing.
    pub async fn post(&self, slug: &str) -> Result<BlogPost, BackendError> {
        let post = with_slug(self.one(Resource::Blog, slug).await?);
        if !post.published {
            return Err(BackendError::Status {
                status: 404,
                message: format!("Post not found: {}", slug),
            });
        }
        Ok(post)
    }

    pub async fn dashboard(&self, config: &RequestConfig) -> Result<DashboardCounts, BackendError> {
        let (cars, brands, importers, posts, slides) = tokio::try_join!(
            self.list::<serde_json::Value>(Resource::Cars, config),
            self.list::<serde_json::Value>(Resource::Brands, config),
            self.list::<serde_json::Value>(Resource::Importers, config),
            self.list::<serde_json::Value>(Resource::Blog, config),
            self.list::<serde_json::Value>(Resource::HeroSlides, config),
        )?;

        Ok(DashboardCounts {
            cars: cars.len(),
            brands: brands.len(),
            importers: importers.len(),
            posts: posts.len(),
            slides: slides.len(),
        })
    }
}

fn decode_records<T: DeserializeOwned>(resource: Resource, items: Vec<serde_json::Value>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping undecodable {} record at index {}: {}", resource, index, e);
                None
            }
        })
        .collect()
}

fn with_slug(mut post: BlogPost) -> BlogPost {
    if post.slug.is_empty() {
        post.slug = post.id.to_string();
    }
    post
}

fn newest_first<T>(items: &mut [T], created: impl Fn(&T) -> Option<DateTime<Utc>>) {
    items.sort_by(|a, b| created(b).cmp(&created(a)));
}

/// Resolve references against a fetched collection, keeping reference order
/// and dropping duplicates. Embedded records fill in for ids missing from the
/// collection; dangling ids are skipped.
fn resolve<'a, T>(refs: impl IntoIterator<Item = &'a Reference<T>>, pool: &[T]) -> Vec<T>
where
    T: Identified + Clone + 'a,
{
    let mut seen: Vec<&EntityId> = Vec::new();
    let mut resolved = Vec::new();

    for reference in refs {
        let id = reference.id();
        if seen.contains(&id) {
            continue;
        }
        seen.push(id);

        let found = pool
            .iter()
            .find(|item| item.entity_id() == id)
            .or_else(|| reference.embedded());
        if let Some(item) = found {
            resolved.push(item.clone());
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, route: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/{}", route)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn catalog(server: &MockServer) -> CatalogService {
        CatalogService::new(BackendClient::new(format!("{}/api", server.uri())).unwrap())
    }

    fn cars_json() -> serde_json::Value {
        json!([
            {"_id": "c1", "model": "Land Cruiser", "type": "SUV", "price": 90000, "brand": "b1",
             "importer": "i1", "createdAt": "2024-01-01T00:00:00Z"},
            {"_id": "c2", "model": "Civic", "type": "SEDAN", "price": "21000.50",
             "brands": [{"_id": "b2", "name": "Honda"}], "createdAt": "2024-03-01T00:00:00Z"},
            {"_id": "c3", "model": "Hilux", "type": "PICKUP", "price": 30000, "brands": ["b1", "b9"],
             "importer": {"_id": "i1", "name": "Gulf Motors"}}
        ])
    }

    #[tokio::test]
    async fn test_home_fans_out_and_trims() {
        let server = MockServer::start().await;
        mount(&server, "hero-slides", json!({"data": [
            {"id": "s2", "title": "Second", "order": 2},
            {"id": "s1", "title": "First", "order": 1},
            {"id": "s3", "title": "Hidden", "order": 0, "isActive": false}
        ]}))
        .await;
        mount(&server, "brands", json!([{"_id": "b1", "name": "Toyota"}])).await;
        mount(&server, "cars", cars_json()).await;
        mount(&server, "blog", json!([
            {"_id": "p1", "title": "Draft", "published": false, "createdAt": "2024-05-01T00:00:00Z"},
            {"_id": "p2", "title": "Old", "published": true, "createdAt": "2023-01-01T00:00:00Z"},
            {"_id": "p3", "title": "New", "published": true, "createdAt": "2024-02-01T00:00:00Z"}
        ]))
        .await;

        let home = catalog(&server).home().await.unwrap();

        let slides: Vec<&str> = home.slides.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(slides, vec!["First", "Second"]);
        let cars: Vec<&str> = home.cars.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(cars, vec!["c2", "c1", "c3"]);
        let posts: Vec<&str> = home.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(posts, vec!["New", "Old"]);
        assert_eq!(home.brands.len(), 1);
    }

    #[tokio::test]
    async fn test_home_fails_when_one_read_fails() {
        let server = MockServer::start().await;
        mount(&server, "hero-slides", json!([])).await;
        mount(&server, "brands", json!([])).await;
        mount(&server, "blog", json!([])).await;
        Mock::given(method("GET"))
            .and(path("/api/cars"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = catalog(&server).home().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_car_detail_resolves_references() {
        let server = MockServer::start().await;
        mount(&server, "cars/c3", json!({"data": cars_json()[2].clone()})).await;
        mount(&server, "brands", json!([{"_id": "b1", "name": "Toyota"}, {"_id": "b2", "name": "Honda"}])).await;
        mount(&server, "importers", json!([{"_id": "i1", "name": "Gulf Motors", "brands": ["b1"]}])).await;

        let detail = catalog(&server).car_detail("c3").await.unwrap();
        let brands: Vec<&str> = detail.brands.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(brands, vec!["Toyota"]);
        assert_eq!(detail.importer.unwrap().name, "Gulf Motors");
    }

    #[tokio::test]
    async fn test_brand_detail_filters_related() {
        let server = MockServer::start().await;
        mount(&server, "brands/b1", json!({"_id": "b1", "name": "Toyota"})).await;
        mount(&server, "cars", cars_json()).await;
        mount(&server, "importers", json!([
            {"_id": "i1", "name": "Gulf Motors", "brands": ["b1"]},
            {"_id": "i2", "name": "Other", "brands": [{"_id": "b2", "name": "Honda"}]}
        ]))
        .await;

        let detail = catalog(&server).brand_detail("b1").await.unwrap();
        let cars: Vec<&str> = detail.cars.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(cars, vec!["c1", "c3"]);
        assert_eq!(detail.importers.len(), 1);
    }

    #[tokio::test]
    async fn test_importer_detail() {
        let server = MockServer::start().await;
        mount(&server, "importers/i1", json!({"_id": "i1", "name": "Gulf Motors", "brands": ["b1", "b1"]})).await;
        mount(&server, "brands", json!([{"_id": "b1", "name": "Toyota"}])).await;
        mount(&server, "cars", cars_json()).await;

        let detail = catalog(&server).importer_detail("i1").await.unwrap();
        assert_eq!(detail.brands.len(), 1);
        let cars: Vec<&str> = detail.cars.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(cars, vec!["c1", "c3"]);
    }

    #[tokio::test]
    async fn test_car_listing_filters() {
        let server = MockServer::start().await;
        mount(&server, "cars", cars_json()).await;
        mount(&server, "brands", json!([])).await;

        let filter = CarFilter {
            brand: Some("b1".to_string()),
            q: Some("hil".to_string()),
            ..CarFilter::default()
        };
        let listing = catalog(&server).car_listing(&filter).await.unwrap();
        assert_eq!(listing.cars.len(), 1);
        assert_eq!(listing.cars[0].model, "Hilux");
        assert_eq!(listing.types.len(), CarType::ALL.len());
    }

    #[tokio::test]
    async fn test_bad_record_does_not_sink_the_list() {
        let server = MockServer::start().await;
        mount(&server, "cars", json!([
            {"_id": "c1", "model": "Civic", "type": "SEDAN", "description": null},
            {"_id": "c2", "model": "Actros", "type": "TRUCK"},
            "not a car"
        ]))
        .await;
        mount(&server, "brands", json!([])).await;

        let listing = catalog(&server).car_listing(&CarFilter::default()).await.unwrap();
        let cars: Vec<&str> = listing.cars.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(cars, vec!["c1"]);
        assert_eq!(listing.cars[0].description, "");
    }

    #[tokio::test]
    async fn test_draft_post_is_not_found() {
        let server = MockServer::start().await;
        mount(&server, "blog/draft", json!({"_id": "p1", "title": "Draft", "slug": "draft"})).await;
        mount(&server, "blog/live", json!({"_id": "p2", "title": "Live", "slug": "live", "published": true})).await;

        let catalog = catalog(&server);
        assert!(catalog.post("draft").await.unwrap_err().is_not_found());
        assert_eq!(catalog.post("live").await.unwrap().title, "Live");
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let server = MockServer::start().await;
        mount(&server, "cars", cars_json()).await;
        mount(&server, "brands", json!([{"id": 1}, {"id": 2}])).await;
        mount(&server, "importers", json!({"data": []})).await;
        mount(&server, "blog", json!([{"id": 1}])).await;
        mount(&server, "hero-slides", json!([])).await;

        let counts = catalog(&server).dashboard(&RequestConfig::new().bearer("t")).await.unwrap();
        assert_eq!(
            counts,
            DashboardCounts {
                cars: 3,
                brands: 2,
                importers: 0,
                posts: 1,
                slides: 0
            }
        );
    }

    #[test]
    fn test_resolve_prefers_pool_and_skips_dangling() {
        let pool: Vec<Brand> = serde_json::from_value(json!([{"_id": "b1", "name": "Toyota"}])).unwrap();
        let refs: Vec<Reference<Brand>> =
            serde_json::from_value(json!([{"_id": "b1", "name": "stale"}, "b1", "missing", {"_id": "b3", "name": "Kia"}]))
                .unwrap();

        let names: Vec<String> = resolve(refs.iter(), &pool).into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Toyota", "Kia"]);
    }
}
