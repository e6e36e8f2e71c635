syn::custom_keyword!(drop);
