//! Site settings and color schemes.

use startpage::{
    ColorSchemeId,
    backend::BackendImpl,
    settings::{GlobalSettings, NewColorScheme},
};

use crate::helpers::*;

fn scheme(name: &str, is_dark: bool) -> NewColorScheme {
    NewColorScheme {
        name: name.to_string(),
        is_dark,
        preview_colors: vec!["#000000".to_string(), "#ffffff".to_string()],
        css_variables: "--bg: #000;".to_string(),
    }
}

#[tokio::test]
async fn unset_settings_read_as_all_off() {
    let sp = test_startpages().await;
    let settings = sp.global_settings().await.unwrap();
    assert_eq!(*settings, GlobalSettings::default());
    assert!(!settings.ntfy_active);
    assert!(!settings.daily_mail_active);
}

#[tokio::test]
async fn update_replaces_cached_settings() {
    let sp = test_startpages().await;
    // Prime the cache with the defaults.
    sp.global_settings().await.unwrap();

    let wanted = GlobalSettings {
        ntfy_active: true,
        daily_mail_active: true,
        daily_mail_include_registrations: false,
    };
    sp.update_settings(wanted).await.unwrap();
    assert_eq!(*sp.global_settings().await.unwrap(), wanted);
    assert_eq!(sp.backend().load_settings().await.unwrap(), Some(wanted));
}

#[tokio::test]
async fn clones_share_the_cache() {
    let sp = test_startpages().await;
    let other = sp.clone();
    other
        .update_settings(GlobalSettings {
            ntfy_active: true,
            ..GlobalSettings::default()
        })
        .await
        .unwrap();
    assert!(sp.global_settings().await.unwrap().ntfy_active);
}

#[tokio::test]
async fn color_schemes_are_listed_by_id() {
    let sp = test_startpages().await;
    let light = sp.add_color_scheme(scheme("  Light ", false)).await.unwrap();
    let dark = sp.add_color_scheme(scheme("Dark", true)).await.unwrap();
    assert_eq!(light.name, "Light");

    let listed = sp.list_color_schemes().await.unwrap();
    assert_eq!(listed, vec![light, dark.clone()]);
    assert!(listed[1].is_dark);
    assert_eq!(listed[1].preview_colors.len(), 2);

    let err = sp.add_color_scheme(scheme("", false)).await.unwrap_err();
    assert!(err.is_invalid_input());
}

#[tokio::test]
async fn deleting_a_scheme_clears_selections() {
    let sp = test_startpages().await;
    let owner = register(&sp, "alice").await;
    let dark = sp.add_color_scheme(scheme("Dark", true)).await.unwrap();

    sp.select_theme(owner, Some(dark.id)).await.unwrap();
    assert_eq!(sp.theme_for(owner).await.unwrap(), Some(dark.clone()));

    sp.delete_color_scheme(dark.id).await.unwrap();
    assert_eq!(sp.theme_for(owner).await.unwrap(), None);
    assert_eq!(sp.user(owner).await.unwrap().color_scheme, None);

    let err = sp.delete_color_scheme(dark.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn unknown_scheme_cannot_be_selected() {
    let sp = test_startpages().await;
    let owner = register(&sp, "alice").await;

    let err = sp
        .select_theme(owner, Some(ColorSchemeId(404)))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    sp.select_theme(owner, None).await.unwrap();
    assert_eq!(sp.theme_for(owner).await.unwrap(), None);
}
