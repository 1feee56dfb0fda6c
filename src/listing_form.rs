use crate::backend::{Datastore, ObjectStorage};
use crate::error::{Error, FieldError, Result};
use crate::models::{Listing, NewListing, AVAILABLE_FLOWERS};
use crate::notify::Notifier;
use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const CREATED: &str = "Land listing created! Pending verification.";
pub const CREATE_FAILED: &str = "Failed to create listing";

/// Raw listing input exactly as typed by the landowner
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingForm {
    pub title: String,
    pub description: String,
    pub location: String,
    pub space_hectares: String,
    pub price_per_month: String,
    /// Selected flower tags, in selection order
    pub flowers: Vec<String>,
    pub available_from: String,
    pub available_until: String,
    pub images: Vec<ImageFile>,
}

/// A form that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidListing {
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub flowers: Vec<String>,
    pub space_hectares: f64,
    pub price_per_month: f64,
    pub available_from: Option<NaiveDate>,
    pub available_until: Option<NaiveDate>,
}

impl ValidListing {
    pub fn into_new_listing(self, owner_id: Uuid, image_urls: Vec<String>) -> NewListing {
        NewListing::new(
            owner_id,
            self.title,
            self.description,
            self.location,
            self.flowers,
            self.space_hectares,
            self.price_per_month,
            self.available_from,
            self.available_until,
            image_urls,
        )
    }
}

impl ListingForm {
    /// Select or deselect a vocabulary flower; unknown tags are ignored
    pub fn toggle_flower(&mut self, flower: &str) {
        if let Some(pos) = self.flowers.iter().position(|f| f == flower) {
            self.flowers.remove(pos);
        } else if AVAILABLE_FLOWERS.contains(&flower) {
            self.flowers.push(flower.to_string());
        }
    }

    pub fn reset(&mut self) {
        *self = ListingForm::default();
    }

    pub fn validate(&self) -> std::result::Result<ValidListing, Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push(FieldError::new("title", "is required"));
        }
        let location = self.location.trim();
        if location.is_empty() {
            errors.push(FieldError::new("location", "is required"));
        }

        let space_hectares = positive_decimal("space_hectares", &self.space_hectares, &mut errors);
        let price_per_month = positive_decimal("price_per_month", &self.price_per_month, &mut errors);

        let mut flowers: Vec<String> = Vec::new();
        for flower in &self.flowers {
            if !AVAILABLE_FLOWERS.contains(&flower.as_str()) {
                errors.push(FieldError::new("flowers", format!("unknown flower '{}'", flower)));
            } else if !flowers.contains(flower) {
                flowers.push(flower.clone());
            }
        }
        if self.flowers.is_empty() {
            errors.push(FieldError::new("flowers", "select at least one flower"));
        }

        let available_from = optional_date("available_from", &self.available_from, &mut errors);
        let available_until = optional_date("available_until", &self.available_until, &mut errors);
        if let (Some(from), Some(until)) = (available_from, available_until) {
            if until < from {
                errors.push(FieldError::new(
                    "available_until",
                    "must not be earlier than available_from",
                ));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let description = self.description.trim();
        Ok(ValidListing {
            title: title.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            location: location.to_string(),
            flowers,
            space_hectares: space_hectares.unwrap_or_default(),
            price_per_month: price_per_month.unwrap_or_default(),
            available_from,
            available_until,
        })
    }
}

fn positive_decimal(field: &'static str, raw: &str, errors: &mut Vec<FieldError>) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(FieldError::new(field, "is required"));
        return None;
    }
    match raw.replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Some(value),
        Ok(value) if value.is_finite() => {
            errors.push(FieldError::new(field, "must be greater than zero"));
            None
        }
        _ => {
            errors.push(FieldError::new(field, format!("'{}' is not a number", raw)));
            None
        }
    }
}

fn optional_date(field: &'static str, raw: &str, errors: &mut Vec<FieldError>) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(FieldError::new(field, format!("'{}' is not a YYYY-MM-DD date", raw)));
            None
        }
    }
}

/// An image picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = content_type_for(&name).to_string();
        Self {
            name,
            content_type,
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "bin".to_string())
    }
}

fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// `<owner>/<unix millis>-<random>.<ext>`
pub fn storage_key(owner_id: Uuid, file: &ImageFile, millis: i64, nonce: u32) -> String {
    format!("{}/{}-{:08x}.{}", owner_id, millis, nonce, file.extension())
}

#[derive(Debug)]
pub struct UploadFailure {
    pub file_name: String,
    pub error: Error,
}

/// Result of uploading one batch; successes keep selection order
#[derive(Debug, Default)]
pub struct UploadReport {
    pub urls: Vec<String>,
    pub failures: Vec<UploadFailure>,
}

/// Pushes images to object storage, tracking how many are in flight
#[derive(Clone)]
pub struct ImageUploader {
    storage: Arc<dyn ObjectStorage>,
    bucket: String,
    in_flight: Arc<AtomicUsize>,
}

struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn start(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ImageUploader {
    pub fn new(storage: Arc<dyn ObjectStorage>, bucket: impl Into<String>) -> Self {
        Self {
            storage,
            bucket: bucket.into(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Upload every file concurrently; one failure never stops the others
    pub async fn upload_all(&self, owner_id: Uuid, files: &[ImageFile]) -> UploadReport {
        let millis = Utc::now().timestamp_millis();
        let keys: Vec<String> = files
            .iter()
            .map(|file| storage_key(owner_id, file, millis, rand::random()))
            .collect();

        let uploads = files.iter().zip(&keys).map(|(file, key)| {
            let guard = InFlight::start(&self.in_flight);
            async move {
                let result = self
                    .storage
                    .upload(&self.bucket, key, file.bytes.clone(), &file.content_type)
                    .await;
                drop(guard);
                (file, key, result)
            }
        });

        let mut report = UploadReport::default();
        for (file, key, result) in join_all(uploads).await {
            match result {
                Ok(()) => {
                    debug!("Uploaded {} as {}", file.name, key);
                    report.urls.push(self.storage.public_url(&self.bucket, key));
                }
                Err(error) => {
                    warn!("Upload of {} failed: {}", file.name, error);
                    report.failures.push(UploadFailure {
                        file_name: file.name.clone(),
                        error,
                    });
                }
            }
        }
        report
    }
}

/// The landowner's "add land" dialog: form state plus the submit flow
pub struct ListingComposer {
    pub form: ListingForm,
    store: Arc<dyn Datastore>,
    uploader: ImageUploader,
    notifier: Notifier,
}

impl ListingComposer {
    pub fn new(store: Arc<dyn Datastore>, uploader: ImageUploader, notifier: Notifier) -> Self {
        Self {
            form: ListingForm::default(),
            store,
            uploader,
            notifier,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.uploader.in_flight() == 0 && !self.form.flowers.is_empty()
    }

    /// Validate, upload images, then create the listing as pending
    ///
    /// On success the form is cleared. On failure the form keeps its values.
    pub async fn submit(&mut self, owner_id: Uuid) -> Result<Listing> {
        if self.uploader.in_flight() > 0 {
            return Err(Error::Validation(vec![FieldError::new(
                "images",
                "wait for the current upload to finish",
            )]));
        }
        let valid = self.form.validate().map_err(Error::Validation)?;

        let report = self.uploader.upload_all(owner_id, &self.form.images).await;
        for failure in &report.failures {
            self.notifier
                .error(format!("Failed to upload {}", failure.file_name));
        }

        let new_listing = valid.into_new_listing(owner_id, report.urls);
        match self.store.insert_listing(&new_listing).await {
            Ok(listing) => {
                info!(
                    "Listing {} created with {} image(s)",
                    listing.id,
                    listing.image_urls.len()
                );
                self.notifier.success(CREATED);
                self.form.reset();
                Ok(listing)
            }
            Err(err) => {
                self.notifier.error(CREATE_FAILED);
                Err(err)
            }
        }
    }
}
