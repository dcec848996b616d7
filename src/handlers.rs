use crate::archive::{archive, archive_name};
use crate::error::BrowseError;
use crate::models::{DirectoryQuery, PathQuery};
use crate::paths::ResolvedPath;
use crate::snapshot::SnapshotAssembler;
use crate::sort::{SortOrder, SortState};
use crate::stat::{FsStatGateway, NodeStat, StatGateway};
use actix_files::NamedFile;
use actix_web::error::QueryPayloadError;
use actix_web::http::header::{
    Charset, ContentDisposition, DispositionParam, DispositionType, ExtendedValue,
};
use actix_web::{get, web, HttpRequest, HttpResponse};
use log::{debug, info, warn};
use std::time::Instant;

/// Shared per-process state: the resolver and gateway behind every route.
pub type Browser = SnapshotAssembler<FsStatGateway>;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(query_error))
        .service(get_directory)
        .service(download_file)
        .service(download_archive);
}

fn query_error(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    warn!("Rejected query string '{}': {}", req.query_string(), err);
    BrowseError::InvalidQuery(err.to_string()).into()
}

/// Non-ASCII names also get an RFC 5987 `filename*`.
fn attachment(filename: String) -> ContentDisposition {
    let mut parameters = vec![DispositionParam::Filename(filename.clone())];
    if !filename.is_ascii() {
        parameters.push(DispositionParam::FilenameExt(ExtendedValue {
            charset: Charset::Ext(String::from("UTF-8")),
            language_tag: None,
            value: filename.into_bytes(),
        }));
    }
    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters,
    }
}

async fn resolve_and_stat(
    browser: &Browser,
    raw_path: &str,
) -> Result<(ResolvedPath, NodeStat), BrowseError> {
    let resolved = browser.resolver().resolve(raw_path, browser.gateway()).await?;
    let stat = browser
        .gateway()
        .stat(&resolved.absolute)
        .await
        .map_err(|e| BrowseError::from_io(resolved.relative.as_str(), e))?;
    Ok((resolved, stat))
}

#[get("/api/directory")]
pub async fn get_directory(
    browser: web::Data<Browser>,
    query: web::Query<DirectoryQuery>,
) -> Result<HttpResponse, BrowseError> {
    let raw_path = query.path.clone().unwrap_or_default();
    info!("Received request for directory contents: '{}'", raw_path);

    let mut snapshot = match browser.assemble(&raw_path).await {
        Ok(s) => s,
        Err(e) => {
            warn!("Failed to assemble snapshot for '{}': {}", raw_path, e);
            return Err(e);
        }
    };

    let mut sort = match query.sort {
        Some(column) => SortState::new(column, SortOrder::Ascending),
        None => SortState::default(),
    };
    if let Some(order) = query.order {
        sort.order = order;
    }
    sort.sort_snapshot(&mut snapshot);

    Ok(HttpResponse::Ok().json(snapshot))
}

#[get("/api/download")]
pub async fn download_file(
    browser: web::Data<Browser>,
    query: web::Query<PathQuery>,
) -> Result<NamedFile, BrowseError> {
    let raw_path = query.path.clone().unwrap_or_default();
    info!("Received download request for: '{}'", raw_path);

    let (resolved, stat) = match resolve_and_stat(&browser, &raw_path).await {
        Ok(r) => r,
        Err(e) => {
            warn!("Download of '{}' rejected: {}", raw_path, e);
            return Err(e);
        }
    };
    if stat.is_dir() {
        warn!("Download of '{}' rejected: it is a directory", resolved.relative);
        return Err(BrowseError::NotAFile(resolved.relative.to_string()));
    }

    let file = NamedFile::open_async(&resolved.absolute)
        .await
        .map_err(|e| BrowseError::from_io(resolved.relative.as_str(), e))?;
    let filename = resolved.relative.name().to_string();
    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    debug!("Streaming '{}' as {}", resolved.relative, mime);

    Ok(file
        .set_content_type(mime)
        .set_content_disposition(attachment(filename)))
}

#[get("/api/archive")]
pub async fn download_archive(
    browser: web::Data<Browser>,
    query: web::Query<PathQuery>,
) -> Result<HttpResponse, BrowseError> {
    let raw_path = query.path.clone().unwrap_or_default();
    info!("Received archive request for: '{}'", raw_path);
    let start_time = Instant::now();

    let (resolved, _) = match resolve_and_stat(&browser, &raw_path).await {
        Ok(r) => r,
        Err(e) => {
            warn!("Archive of '{}' rejected: {}", raw_path, e);
            return Err(e);
        }
    };

    let bytes = archive(resolved.absolute.clone())
        .await
        .map_err(|e| {
            warn!("Failed to archive '{}': {}", resolved.relative, e);
            BrowseError::from_io(resolved.relative.as_str(), e)
        })?;
    let filename = archive_name(&resolved.relative);
    let mime = mime_guess::from_path(&filename).first_or_octet_stream();

    info!(
        "Archived '{}' ({} bytes) in {:.2?}.",
        resolved.relative,
        bytes.len(),
        start_time.elapsed()
    );
    Ok(HttpResponse::Ok()
        .content_type(mime.as_ref())
        .insert_header(attachment(filename))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_names_use_plain_filename() {
        let disposition = attachment("readme.txt".to_string());
        assert_eq!(
            disposition.parameters,
            vec![DispositionParam::Filename("readme.txt".to_string())]
        );
    }

    #[test]
    fn non_ascii_names_add_extended_filename() {
        let disposition = attachment("résumé.txt".to_string());
        assert_eq!(disposition.parameters.len(), 2);
        assert_eq!(disposition.get_filename(), Some("résumé.txt"));
        let ext = disposition.get_filename_ext().unwrap();
        assert_eq!(ext.value, "résumé.txt".as_bytes());
        assert!(disposition
            .to_string()
            .contains("filename*=UTF-8''r%C3%A9sum%C3%A9.txt"));
    }
}
