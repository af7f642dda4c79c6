//! Dev-mode differences between manifest generations

use super::DevServer;
use crate::error::{ManifestError, Result};
use crate::models::{ContentSecurityPolicy, ContentSecurityPolicyV3, EmittedFile, Manifest};
use crate::transformer::merge_dev_policy;
use crate::transformer::static_script_loader;
use crate::transformer::v3::SERVICE_WORKER_LOADER;

pub trait DevVariant: Send + Sync {
    /// Whether inline scripts of written pages must be allowed by hash
    fn hashes_inline_scripts(&self) -> bool;

    /// Loader for the background context, when it is not already a page
    fn write_background(&self, manifest: &mut Manifest, server: &dyn DevServer) -> Option<EmittedFile>;

    fn apply_csp(&self, manifest: &mut Manifest, origin: &str, inline_hashes: &[String]);
}

pub fn dev_variant_for(version: u8) -> Result<Box<dyn DevVariant>> {
    match version {
        2 => Ok(Box::new(DevV2)),
        3 => Ok(Box::new(DevV3)),
        other => Err(ManifestError::UnsupportedManifestVersion(other)),
    }
}

pub struct DevV2;

impl DevVariant for DevV2 {
    fn hashes_inline_scripts(&self) -> bool {
        true
    }

    fn write_background(&self, _manifest: &mut Manifest, _server: &dyn DevServer) -> Option<EmittedFile> {
        // background scripts were already wrapped in a page
        None
    }

    fn apply_csp(&self, manifest: &mut Manifest, origin: &str, inline_hashes: &[String]) {
        let base = match &manifest.content_security_policy {
            Some(ContentSecurityPolicy::V2(policy)) => policy.as_str(),
            _ => "",
        };
        let merged = merge_dev_policy(base, origin, inline_hashes);
        manifest.content_security_policy = Some(ContentSecurityPolicy::V2(merged));
    }
}

pub struct DevV3;

impl DevVariant for DevV3 {
    fn hashes_inline_scripts(&self) -> bool {
        false
    }

    fn write_background(&self, manifest: &mut Manifest, server: &dyn DevServer) -> Option<EmittedFile> {
        let background = manifest.background.as_mut()?;
        let worker = background.service_worker.as_deref()?;

        // service workers reject import() at install time
        let loader = static_script_loader(SERVICE_WORKER_LOADER, &[server.env_url(), server.url_for(worker)]);
        background.service_worker = Some(loader.file_name.clone());
        background.type_ = Some("module".to_string());
        Some(loader)
    }

    fn apply_csp(&self, manifest: &mut Manifest, origin: &str, inline_hashes: &[String]) {
        let mut policy = match manifest.content_security_policy.take() {
            Some(ContentSecurityPolicy::V3(policy)) => policy,
            Some(ContentSecurityPolicy::V2(extension_pages)) => ContentSecurityPolicyV3 {
                extension_pages: Some(extension_pages),
                sandbox: None,
            },
            None => ContentSecurityPolicyV3::default(),
        };

        let base = policy.extension_pages.as_deref().unwrap_or_default();
        policy.extension_pages = Some(merge_dev_policy(base, origin, inline_hashes));
        manifest.content_security_policy = Some(ContentSecurityPolicy::V3(policy));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Background;
    use pretty_assertions::assert_eq;

    struct Origin;

    impl DevServer for Origin {
        fn origin(&self) -> &str {
            "http://localhost:5173"
        }

        fn transform_index_html(&self, _file: &str, html: &str) -> anyhow::Result<String> {
            Ok(html.to_string())
        }

        fn load_style(&self, _file: &str) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_v2_policy_is_a_string() {
        let mut manifest = Manifest::new(2);
        manifest.content_security_policy = Some(ContentSecurityPolicy::V2("img-src *".to_string()));

        DevV2.apply_csp(&mut manifest, "http://localhost:5173", &["'sha256-x'".to_string()]);
        assert_eq!(
            manifest.content_security_policy,
            Some(ContentSecurityPolicy::V2(
                "img-src *; script-src 'self' http://localhost:5173 'sha256-x'; object-src 'self'".to_string()
            ))
        );
    }

    #[test]
    fn test_v3_policy_created_when_absent() {
        let mut manifest = Manifest::new(3);
        DevV3.apply_csp(&mut manifest, "http://localhost:5173", &[]);

        assert_eq!(
            manifest.content_security_policy,
            Some(ContentSecurityPolicy::V3(ContentSecurityPolicyV3 {
                extension_pages: Some("script-src 'self' http://localhost:5173; object-src 'self'".to_string()),
                sandbox: None,
            }))
        );
    }

    #[test]
    fn test_v3_service_worker_loader() {
        let mut manifest = Manifest::new(3);
        manifest.background = Some(Background {
            service_worker: Some("src/bg.ts".to_string()),
            ..Default::default()
        });

        let loader = DevV3.write_background(&mut manifest, &Origin).unwrap();
        assert_eq!(loader.file_name, "serviceWorker.js");
        assert_eq!(
            loader.text(),
            Some("import \"http://localhost:5173/@vite/env\";\nimport \"http://localhost:5173/src/bg.ts\";")
        );
        assert_eq!(
            manifest.background.unwrap().service_worker.as_deref(),
            Some("serviceWorker.js")
        );
    }
}
