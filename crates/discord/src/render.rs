use {autodelete_channels::Embed, serenity::all::CreateEmbed};

/// Build the serenity embed for a platform-neutral [`Embed`].
pub fn create_embed(embed: &Embed) -> CreateEmbed {
    embed.fields.iter().fold(
        CreateEmbed::new()
            .title(&embed.title)
            .description(&embed.description)
            .colour(embed.color.rgb()),
        |builder, field| builder.field(&field.name, &field.value, field.inline),
    )
}
