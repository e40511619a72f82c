use lading::loader::{Asset, AssetCache, AssetLoader, LoadRequest, LoaderResult};
use type_uuid::TypeUuid;

/// Optional config blob for [`TextLoader`]
#[derive(Clone, Copy, Debug, Default)]
pub struct TextParameters {
    pub trim: bool,
}

#[derive(TypeUuid, Debug)]
#[uuid = "e4a7d9c2-1b36-4f80-a5c9-2d7e6b1f8a04"]
pub struct TextAsset {
    pub text: String,
}

impl Asset for TextAsset {}

pub struct TextLoader;

impl AssetLoader for TextLoader {
    type Asset = TextAsset;
    type Prepared = String;

    fn load_async(
        &self,
        request: &LoadRequest,
    ) -> LoaderResult<String> {
        let text = request.file.read_to_string()?;
        let trim = request
            .config::<TextParameters>()
            .map_or(false, |x| x.trim);
        Ok(if trim { text.trim().to_string() } else { text })
    }

    fn load_sync(
        &self,
        _cache: &AssetCache,
        _request: &LoadRequest,
        prepared: String,
    ) -> LoaderResult<TextAsset> {
        Ok(TextAsset { text: prepared })
    }
}
