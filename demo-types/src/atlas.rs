use crate::texture::TextureAsset;
use lading::loader::{Asset, AssetCache, AssetDescriptor, AssetLoader, LoadRequest, LoaderResult};
use type_uuid::TypeUuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtlasRegion {
    pub name: String,
    pub page: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtlasPage {
    /// Asset name of the page texture
    pub texture: String,
    pub width: u32,
    pub height: u32,
}

/// Parsed atlas file. Page names are already relative to the asset root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AtlasData {
    pub pages: Vec<String>,
    pub regions: Vec<AtlasRegion>,
}

impl AtlasData {
    /// Reads lines of the form `page <file>` and `region <name> <page> <x> <y> <w> <h>`. Blank
    /// lines and lines starting with `#` are skipped.
    pub fn parse(
        atlas_name: &str,
        text: &str,
    ) -> LoaderResult<Self> {
        let mut data = AtlasData::default();
        for (line_index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                ["page", file] => data.pages.push(sibling_name(atlas_name, file)),
                ["region", name, page, x, y, width, height] => {
                    let page: usize = page.parse()?;
                    if page >= data.pages.len() {
                        return Err(format!(
                            "{} line {}: region {} uses page {} before it is declared",
                            atlas_name,
                            line_index + 1,
                            name,
                            page
                        )
                        .into());
                    }

                    data.regions.push(AtlasRegion {
                        name: name.to_string(),
                        page,
                        x: x.parse()?,
                        y: y.parse()?,
                        width: width.parse()?,
                        height: height.parse()?,
                    });
                }
                _ => {
                    return Err(format!(
                        "{} line {}: can't parse {:?}",
                        atlas_name,
                        line_index + 1,
                        line
                    )
                    .into())
                }
            }
        }

        Ok(data)
    }
}

// "ui/menu.atlas" + "menu.png" -> "ui/menu.png"
fn sibling_name(
    atlas_name: &str,
    file: &str,
) -> String {
    match atlas_name.rfind('/') {
        Some(index) => format!("{}/{}", &atlas_name[..index], file),
        None => file.to_string(),
    }
}

#[derive(TypeUuid, Debug)]
#[uuid = "9c2b7e14-3d6a-4f05-8b1e-a7d4c2f9e631"]
pub struct AtlasAsset {
    pub pages: Vec<AtlasPage>,
    pub regions: Vec<AtlasRegion>,
}

impl AtlasAsset {
    pub fn region(
        &self,
        name: &str,
    ) -> Option<&AtlasRegion> {
        self.regions.iter().find(|x| x.name == name)
    }

    pub fn page_of(
        &self,
        region: &AtlasRegion,
    ) -> Option<&AtlasPage> {
        self.pages.get(region.page)
    }
}

impl Asset for AtlasAsset {}

/// Loads texture atlases. Every page is a texture dependency, so the pages are in the cache by the
/// time the atlas finishes and region bounds can be checked against them.
pub struct AtlasLoader;

impl AssetLoader for AtlasLoader {
    type Asset = AtlasAsset;
    type Prepared = AtlasData;

    fn dependencies(
        &self,
        request: &LoadRequest,
    ) -> LoaderResult<Vec<AssetDescriptor>> {
        let data = AtlasData::parse(request.name, &request.file.read_to_string()?)?;
        Ok(data
            .pages
            .into_iter()
            .map(|page| AssetDescriptor::new::<TextureAsset>(page))
            .collect())
    }

    fn load_async(
        &self,
        request: &LoadRequest,
    ) -> LoaderResult<AtlasData> {
        AtlasData::parse(request.name, &request.file.read_to_string()?)
    }

    fn load_sync(
        &self,
        cache: &AssetCache,
        request: &LoadRequest,
        prepared: AtlasData,
    ) -> LoaderResult<AtlasAsset> {
        let mut pages = Vec::with_capacity(prepared.pages.len());
        for texture in prepared.pages {
            let page = cache.get::<TextureAsset>(&texture)?;
            pages.push(AtlasPage {
                width: page.width,
                height: page.height,
                texture,
            });
        }

        for region in &prepared.regions {
            let page = &pages[region.page];
            if region.x.saturating_add(region.width) > page.width
                || region.y.saturating_add(region.height) > page.height
            {
                return Err(format!(
                    "{}: region {} does not fit on {} ({}x{})",
                    request.name, region.name, page.texture, page.width, page.height
                )
                .into());
            }
        }

        log::debug!(
            "{} has {} pages and {} regions",
            request.name,
            pages.len(),
            prepared.regions.len()
        );
        Ok(AtlasAsset {
            pages,
            regions: prepared.regions,
        })
    }
}
